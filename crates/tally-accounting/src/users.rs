use anyhow::Result;
use thiserror::Error as ThisError;
use tracing::{info, warn};

use tally_data::{
    Category, CategoryFilter, Delete, Insert, Query, User, UserFilter,
};

use crate::categories::seed_default_categories;
use crate::datetime::now_millis;

#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum UserError {
    #[error("user {0} is already registered")]
    UserExists(String),
    #[error("invalid user or password")]
    InvalidCredentials,
}

async fn find_user<DB>(db: &DB, user_id: &str) -> Result<Option<User>>
where
    DB: Query<User, Filter = UserFilter> + Send + Sync,
{
    let users = db
        .query(&UserFilter {
            id: Some(user_id.to_string()),
        })
        .await?;
    Ok(users.into_iter().next())
}

/// Create a new user with the default categories.
pub async fn register<DB>(db: &DB, user_id: &str, password: &str) -> Result<User>
where
    DB: Query<User, Filter = UserFilter>
        + Insert<User>
        + Query<Category, Filter = CategoryFilter>
        + Insert<Category>
        + Send
        + Sync,
{
    if find_user(db, user_id).await?.is_some() {
        return Err(UserError::UserExists(user_id.to_string()).into());
    }
    let user = Insert::insert(db, User::new(user_id, password, now_millis())).await?;
    seed_default_categories(db, &user.id).await?;
    info!(user_id, "registered user");
    Ok(user)
}

/// Check the password of a user.
pub async fn authenticate<DB>(db: &DB, user_id: &str, password: &str) -> Result<User>
where
    DB: Query<User, Filter = UserFilter> + Send + Sync,
{
    match find_user(db, user_id).await? {
        Some(user) if user.check_password(password) => Ok(user),
        _ => {
            warn!(user_id, "authentication failed");
            Err(UserError::InvalidCredentials.into())
        }
    }
}

/// Authenticate a known user, register an unknown one.
pub async fn login_or_register<DB>(db: &DB, user_id: &str, password: &str) -> Result<User>
where
    DB: Query<User, Filter = UserFilter>
        + Insert<User>
        + Query<Category, Filter = CategoryFilter>
        + Insert<Category>
        + Send
        + Sync,
{
    if find_user(db, user_id).await?.is_some() {
        authenticate(db, user_id, password).await
    } else {
        register(db, user_id, password).await
    }
}

/// Remove a user and everything the user owns.
pub async fn delete_user<DB>(db: &DB, user_id: &str) -> Result<()>
where
    DB: Query<User, Filter = UserFilter> + Delete<User> + Send + Sync,
{
    if let Some(user) = find_user(db, user_id).await? {
        db.delete(user).await?;
        info!(user_id, "deleted user");
    }
    Ok(())
}
