use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A spending ceiling for a month. Without a category
/// the budget covers the whole month.
#[derive(Debug, Default, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: String,
    pub category: Option<String>,
    pub amount: f64,
    /// Formatted as YYYY-MM
    pub month: String,
}

impl Budget {
    pub fn is_total(&self) -> bool {
        self.category.is_none()
    }
}

/// Which budgets of a month to select.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum BudgetScope {
    #[default]
    Any,
    /// Only the month total
    Total,
    /// All per category budgets
    Categories,
    Category(String),
}

#[derive(Debug, Default, Clone)]
pub struct BudgetFilter {
    pub id: Option<i64>,
    pub user_id: Option<String>,
    pub month: Option<String>,
    pub scope: BudgetScope,
}
