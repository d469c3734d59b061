use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    #[default]
    Expense,
    Income,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Expense => "EXPENSE",
            RecordType::Income => "INCOME",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EXPENSE" => Ok(RecordType::Expense),
            "INCOME" => Ok(RecordType::Income),
            _ => Err(format!("unknown record type: {}", s)),
        }
    }
}

/// A single dated income or expense entry.
#[derive(Debug, Default, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub user_id: String,
    pub record_type: RecordType,
    pub amount: f64,
    pub category: String,
    pub note: String,
    /// Milliseconds since the unix epoch
    pub timestamp: i64,
    /// Receipt image reference
    pub image_uri: Option<String>,
}

/// Select records. The time range is half open:
/// `time_from <= timestamp < time_until`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RecordFilter {
    pub id: Option<i64>,
    pub user_id: Option<String>,
    pub record_type: Option<RecordType>,
    pub category: Option<String>,
    pub time_from: Option<i64>,
    pub time_until: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_from_str() {
        assert_eq!("expense".parse(), Ok(RecordType::Expense));
        assert_eq!("INCOME".parse(), Ok(RecordType::Income));
        assert!("transfer".parse::<RecordType>().is_err());
    }
}
