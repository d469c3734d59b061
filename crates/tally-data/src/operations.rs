use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::{Budget, Category, Change, Record};

#[async_trait]
pub trait Query<T> {
    type Filter;
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<T>>;
}

#[async_trait]
pub trait Insert<T> {
    async fn insert(&self, item: T) -> Result<T>;
}

#[async_trait]
pub trait Update<T> {
    async fn update(&self, item: T) -> Result<T>;
}

#[async_trait]
pub trait Retrieve<T> {
    type Key;
    async fn retrieve(&self, key: Self::Key) -> Result<T>;
}

#[async_trait]
pub trait Delete<T> {
    async fn delete(&self, item: T) -> Result<()>;
}

/// Everything a user owns, as a single unit.
#[derive(Debug, Default, Clone)]
pub struct UserData {
    pub records: Vec<Record>,
    pub budgets: Vec<Budget>,
    pub categories: Vec<Category>,
}

#[async_trait]
pub trait Replace {
    /// Replace all records, budgets and categories of a user
    /// with the given data in one step.
    async fn replace(&self, user_id: &str, data: UserData) -> Result<()>;
}

/// A store that announces its writes.
pub trait Subscribe {
    fn subscribe(&self) -> broadcast::Receiver<Change>;
}
