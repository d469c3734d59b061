use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Users,
    Records,
    Categories,
    Budgets,
}

/// A write to the ledger store, scoped to the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub user_id: String,
    pub table: Table,
}

impl Change {
    pub fn new(user_id: impl Into<String>, table: Table) -> Self {
        Self {
            user_id: user_id.into(),
            table,
        }
    }

    /// Does this change affect the given user's spending or budgets?
    /// Deleting a user drops both, so user changes count too.
    pub fn touches_budgets_of(&self, user_id: &str) -> bool {
        self.user_id == user_id
            && matches!(self.table, Table::Users | Table::Records | Table::Budgets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touches_budgets_of() {
        assert!(Change::new("alice", Table::Records).touches_budgets_of("alice"));
        assert!(Change::new("alice", Table::Budgets).touches_budgets_of("alice"));
        assert!(Change::new("alice", Table::Users).touches_budgets_of("alice"));
        assert!(!Change::new("alice", Table::Categories).touches_budgets_of("alice"));
        assert!(!Change::new("bob", Table::Records).touches_budgets_of("alice"));
    }
}
