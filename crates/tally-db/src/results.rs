use sqlx::FromRow;
use thiserror::Error as ThisError;

use tally_data::Table;

/// Store errors
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum QueryError {
    #[error("{0:?} entry {1} not found")]
    NotFound(Table, String),
}

/// The row id returned from an insert.
#[derive(Debug, Clone, FromRow)]
pub struct Id<T> {
    pub id: T,
}
