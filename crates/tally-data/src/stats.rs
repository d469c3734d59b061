use serde::{Deserialize, Serialize};

/// Sum of amounts for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    pub category: String,
    pub total: f64,
}

/// Sum and number of records for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatWithCount {
    pub category: String,
    pub total: f64,
    pub count: u32,
}

impl From<CategoryStatWithCount> for CategoryStat {
    fn from(stat: CategoryStatWithCount) -> Self {
        CategoryStat {
            category: stat.category,
            total: stat.total,
        }
    }
}

/// Sum of amounts for one day of the month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStat {
    /// Day of month, two digits ("01" to "31")
    pub day: String,
    pub total: f64,
}
