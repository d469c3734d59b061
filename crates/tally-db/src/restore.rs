use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Connection as SqlConnection, QueryBuilder, Sqlite};
use tracing::info;

use tally_data::{Change, Replace, Table, UserData};

use crate::Connection;

#[async_trait]
impl Replace for Connection {
    /// Replace all data of a user within one transaction.
    /// Row ids are reassigned, the owner is always `user_id`.
    async fn replace(&self, user_id: &str, data: UserData) -> Result<()> {
        {
            let mut conn = self.lock().await;
            let mut tx = conn.begin().await?;

            for table in ["records", "budgets", "categories"] {
                QueryBuilder::<Sqlite>::new(format!("DELETE FROM {} WHERE user_id = ", table))
                    .push_bind(user_id)
                    .build()
                    .execute(&mut *tx)
                    .await?;
            }

            for record in &data.records {
                let mut qry = QueryBuilder::<Sqlite>::new(
                    "INSERT INTO records (user_id, record_type, amount, \
                     category, note, timestamp, image_uri) VALUES (",
                );
                qry.separated(", ")
                    .push_bind(user_id)
                    .push_bind(record.record_type)
                    .push_bind(record.amount)
                    .push_bind(&record.category)
                    .push_bind(&record.note)
                    .push_bind(record.timestamp)
                    .push_bind(&record.image_uri);
                qry.push(")").build().execute(&mut *tx).await?;
            }

            for budget in &data.budgets {
                let mut qry = QueryBuilder::<Sqlite>::new(
                    "INSERT INTO budgets (user_id, category, amount, month) VALUES (",
                );
                qry.separated(", ")
                    .push_bind(user_id)
                    .push_bind(&budget.category)
                    .push_bind(budget.amount)
                    .push_bind(&budget.month);
                qry.push(")").build().execute(&mut *tx).await?;
            }

            for category in &data.categories {
                let mut qry = QueryBuilder::<Sqlite>::new(
                    "INSERT INTO categories (user_id, name, record_type, \
                     icon, is_custom) VALUES (",
                );
                qry.separated(", ")
                    .push_bind(user_id)
                    .push_bind(&category.name)
                    .push_bind(category.record_type)
                    .push_bind(&category.icon)
                    .push_bind(category.is_custom);
                qry.push(")").build().execute(&mut *tx).await?;
            }

            tx.commit().await?;
        }

        info!(
            user_id,
            records = data.records.len(),
            budgets = data.budgets.len(),
            categories = data.categories.len(),
            "replaced user data"
        );
        for table in [Table::Records, Table::Budgets, Table::Categories] {
            self.notify(Change::new(user_id, table));
        }
        Ok(())
    }
}
