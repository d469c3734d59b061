use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::RecordType;

pub const DEFAULT_ICON: &str = "ic_category_other";

#[derive(Debug, Default, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub record_type: RecordType,
    pub icon: String,
    pub is_custom: bool,
}

#[derive(Debug, Default, Clone)]
pub struct CategoryFilter {
    pub id: Option<i64>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub record_type: Option<RecordType>,
}
