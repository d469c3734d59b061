pub mod datetime;
pub mod aggregator;
pub mod budget;
pub mod categories;
pub mod records;
pub mod users;
pub mod backup;
pub mod export;
