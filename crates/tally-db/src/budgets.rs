use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use tally_data::{
    Budget, BudgetFilter, BudgetScope, Change, Delete, Insert, Query, Retrieve,
    Table, Update,
};

use crate::{
    results::{Id, QueryError},
    Connection,
};

#[async_trait]
impl Query<Budget> for Connection {
    type Filter = BudgetFilter;

    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Budget>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                id,
                user_id,
                category,
                ROUND(amount, 10) AS amount,
                month
            FROM budgets
            WHERE 1
            "#,
        );
        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(user_id) = filter.user_id.clone() {
            qry.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(month) = filter.month.clone() {
            qry.push(" AND month = ").push_bind(month);
        }
        match &filter.scope {
            BudgetScope::Any => {}
            BudgetScope::Total => {
                qry.push(" AND category IS NULL");
            }
            BudgetScope::Categories => {
                qry.push(" AND category IS NOT NULL");
            }
            BudgetScope::Category(name) => {
                qry.push(" AND category = ").push_bind(name.clone());
            }
        }
        qry.push(" ORDER BY month, category IS NOT NULL, id");

        let budgets: Vec<Budget> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(budgets)
    }
}

#[async_trait]
impl Retrieve<Budget> for Connection {
    type Key = i64;

    async fn retrieve(&self, id: Self::Key) -> Result<Budget> {
        let filter = BudgetFilter {
            id: Some(id),
            ..Default::default()
        };
        let mut budgets: Vec<Budget> = self.query(&filter).await?;
        let budget = budgets
            .pop()
            .ok_or_else(|| QueryError::NotFound(Table::Budgets, id.to_string()))?;
        Ok(budget)
    }
}

#[async_trait]
impl Insert<Budget> for Connection {
    async fn insert(&self, budget: Budget) -> Result<Budget> {
        let insert: Id<i64> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO budgets (
                    user_id,
                    category,
                    amount,
                    month
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(&budget.user_id)
                .push_bind(&budget.category)
                .push_bind(budget.amount)
                .push_bind(&budget.month);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };
        debug!(id = insert.id, month = %budget.month, "budget inserted");
        self.notify(Change::new(&budget.user_id, Table::Budgets));
        self.retrieve(insert.id).await
    }
}

#[async_trait]
impl Update<Budget> for Connection {
    /// Update the amount of a budget in place
    async fn update(&self, budget: Budget) -> Result<Budget> {
        {
            let mut conn = self.lock().await;
            QueryBuilder::<Sqlite>::new("UPDATE budgets SET")
                .push(" amount = ")
                .push_bind(budget.amount)
                .push(" WHERE id = ")
                .push_bind(budget.id)
                .build()
                .execute(&mut *conn)
                .await?;
        }
        debug!(id = budget.id, amount = budget.amount, "budget updated");
        self.notify(Change::new(&budget.user_id, Table::Budgets));
        self.retrieve(budget.id).await
    }
}

#[async_trait]
impl Delete<Budget> for Connection {
    async fn delete(&self, budget: Budget) -> Result<()> {
        {
            let mut conn = self.lock().await;
            QueryBuilder::<Sqlite>::new("DELETE FROM budgets WHERE id = ")
                .push_bind(budget.id)
                .build()
                .execute(&mut *conn)
                .await?;
        }
        debug!(id = budget.id, "budget deleted");
        self.notify(Change::new(&budget.user_id, Table::Budgets));
        Ok(())
    }
}
