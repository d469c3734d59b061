use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use tally_data::{
    Category, CategoryFilter, Change, Delete, Insert, Query, Retrieve, Table,
};

use crate::{
    results::{Id, QueryError},
    Connection,
};

#[async_trait]
impl Query<Category> for Connection {
    type Filter = CategoryFilter;

    /// Fetch categories, built-in ones first
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Category>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                id,
                user_id,
                name,
                record_type,
                icon,
                is_custom
            FROM categories
            WHERE 1
            "#,
        );
        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(user_id) = filter.user_id.clone() {
            qry.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(name) = filter.name.clone() {
            qry.push(" AND name = ").push_bind(name);
        }
        if let Some(record_type) = filter.record_type {
            qry.push(" AND record_type = ").push_bind(record_type);
        }
        qry.push(" ORDER BY is_custom, id");

        let categories: Vec<Category> =
            qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(categories)
    }
}

#[async_trait]
impl Retrieve<Category> for Connection {
    type Key = i64;

    async fn retrieve(&self, id: Self::Key) -> Result<Category> {
        let filter = CategoryFilter {
            id: Some(id),
            ..Default::default()
        };
        let mut categories: Vec<Category> = self.query(&filter).await?;
        let category = categories
            .pop()
            .ok_or_else(|| QueryError::NotFound(Table::Categories, id.to_string()))?;
        Ok(category)
    }
}

#[async_trait]
impl Insert<Category> for Connection {
    async fn insert(&self, category: Category) -> Result<Category> {
        let insert: Id<i64> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO categories (
                    user_id,
                    name,
                    record_type,
                    icon,
                    is_custom
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(&category.user_id)
                .push_bind(&category.name)
                .push_bind(category.record_type)
                .push_bind(&category.icon)
                .push_bind(category.is_custom);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };
        debug!(id = insert.id, name = %category.name, "category inserted");
        self.notify(Change::new(&category.user_id, Table::Categories));
        self.retrieve(insert.id).await
    }
}

#[async_trait]
impl Delete<Category> for Connection {
    async fn delete(&self, category: Category) -> Result<()> {
        {
            let mut conn = self.lock().await;
            QueryBuilder::<Sqlite>::new("DELETE FROM categories WHERE id = ")
                .push_bind(category.id)
                .build()
                .execute(&mut *conn)
                .await?;
        }
        self.notify(Change::new(&category.user_id, Table::Categories));
        Ok(())
    }
}
