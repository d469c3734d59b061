
pub mod connection;
pub use connection::Connection;

pub mod results;
pub use results::QueryError;

pub mod schema;

pub mod users;
pub mod records;
pub mod categories;
pub mod budgets;
pub mod restore;
