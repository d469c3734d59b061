use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

use tally_data::{Change, Delete, Insert, Query, Retrieve, Table, User, UserFilter};

use crate::{results::QueryError, Connection};

#[async_trait]
impl Query<User> for Connection {
    type Filter = UserFilter;

    async fn query(&self, filter: &Self::Filter) -> Result<Vec<User>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                id,
                password_hash,
                salt,
                created_at
            FROM users
            WHERE 1
            "#,
        );
        if let Some(id) = filter.id.clone() {
            qry.push(" AND id = ").push_bind(id);
        }
        qry.push(" ORDER BY created_at, id");

        let users: Vec<User> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(users)
    }
}

#[async_trait]
impl Retrieve<User> for Connection {
    type Key = String;

    async fn retrieve(&self, id: Self::Key) -> Result<User> {
        let filter = UserFilter { id: Some(id.clone()) };
        let mut users: Vec<User> = self.query(&filter).await?;
        let user = users
            .pop()
            .ok_or_else(|| QueryError::NotFound(Table::Users, id.to_string()))?;
        Ok(user)
    }
}

#[async_trait]
impl Insert<User> for Connection {
    async fn insert(&self, user: User) -> Result<User> {
        {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO users (
                    id,
                    password_hash,
                    salt,
                    created_at
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(&user.id)
                .push_bind(&user.password_hash)
                .push_bind(&user.salt)
                .push_bind(user.created_at);
            qry.push(")").build().execute(&mut *conn).await?;
        }
        info!(user_id = %user.id, "user created");
        self.notify(Change::new(&user.id, Table::Users));
        self.retrieve(user.id).await
    }
}

#[async_trait]
impl Delete<User> for Connection {
    /// Delete a user together with everything it owns
    async fn delete(&self, user: User) -> Result<()> {
        {
            let mut conn = self.lock().await;
            QueryBuilder::<Sqlite>::new("DELETE FROM users WHERE id = ")
                .push_bind(&user.id)
                .build()
                .execute(&mut *conn)
                .await?;
        }
        info!(user_id = %user.id, "user deleted");
        self.notify(Change::new(&user.id, Table::Users));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_user_insert_and_retrieve() {
        let db = Connection::open_test().await;
        let user = db.insert(User::new("13800000000", "secret", 1700000000000))
            .await
            .unwrap();
        assert_eq!(user.id, "13800000000");
        assert_eq!(user.created_at, 1700000000000);
        assert!(user.check_password("secret"));

        let user: User = db.retrieve("13800000000".to_string()).await.unwrap();
        assert_eq!(user.id, "13800000000");
    }

    #[tokio::test]
    async fn test_user_insert_duplicate_fails() {
        let db = Connection::open_test().await;
        db.insert(User::new("alice", "a", 0)).await.unwrap();
        assert!(db.insert(User::new("alice", "b", 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_user_retrieve_missing() {
        let db = Connection::open_test().await;
        let result: Result<User> = db.retrieve("nobody".to_string()).await;
        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<QueryError>(),
            Some(&QueryError::NotFound(Table::Users, "nobody".to_string()))
        );
    }

    #[tokio::test]
    async fn test_user_delete() {
        let db = Connection::open_test().await;
        let user = db.insert(User::new("alice", "a", 0)).await.unwrap();
        db.delete(user).await.unwrap();

        let users: Vec<User> = db.query(&UserFilter::default()).await.unwrap();
        assert!(users.is_empty());
    }
}
