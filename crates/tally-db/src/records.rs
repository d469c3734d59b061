use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use tally_data::{
    Change, Delete, Insert, Query, Record, RecordFilter, Retrieve, Table, Update,
};

use crate::{
    results::{Id, QueryError},
    Connection,
};

#[async_trait]
impl Query<Record> for Connection {
    type Filter = RecordFilter;

    /// Fetch records, newest first
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Record>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                id,
                user_id,
                record_type,
                ROUND(amount, 10) AS amount,
                category,
                note,
                timestamp,
                image_uri
            FROM records
            WHERE 1
            "#,
        );
        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(user_id) = filter.user_id.clone() {
            qry.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(record_type) = filter.record_type {
            qry.push(" AND record_type = ").push_bind(record_type);
        }
        if let Some(category) = filter.category.clone() {
            qry.push(" AND category = ").push_bind(category);
        }
        if let Some(time_from) = filter.time_from {
            qry.push(" AND timestamp >= ").push_bind(time_from);
        }
        if let Some(time_until) = filter.time_until {
            qry.push(" AND timestamp < ").push_bind(time_until);
        }
        qry.push(" ORDER BY timestamp DESC, id DESC");

        let records: Vec<Record> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(records)
    }
}

#[async_trait]
impl Retrieve<Record> for Connection {
    type Key = i64;

    async fn retrieve(&self, id: Self::Key) -> Result<Record> {
        let filter = RecordFilter {
            id: Some(id),
            ..Default::default()
        };
        let mut records: Vec<Record> = self.query(&filter).await?;
        let record = records
            .pop()
            .ok_or_else(|| QueryError::NotFound(Table::Records, id.to_string()))?;
        Ok(record)
    }
}

#[async_trait]
impl Insert<Record> for Connection {
    async fn insert(&self, record: Record) -> Result<Record> {
        let insert: Id<i64> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO records (
                    user_id,
                    record_type,
                    amount,
                    category,
                    note,
                    timestamp,
                    image_uri
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(&record.user_id)
                .push_bind(record.record_type)
                .push_bind(record.amount)
                .push_bind(&record.category)
                .push_bind(&record.note)
                .push_bind(record.timestamp)
                .push_bind(&record.image_uri);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };
        debug!(id = insert.id, user_id = %record.user_id, "record inserted");
        self.notify(Change::new(&record.user_id, Table::Records));
        self.retrieve(insert.id).await
    }
}

#[async_trait]
impl Update<Record> for Connection {
    /// Only a record owned by `record.user_id` is changed.
    async fn update(&self, record: Record) -> Result<Record> {
        let updated = {
            let mut conn = self.lock().await;
            let result = QueryBuilder::<Sqlite>::new("UPDATE records SET")
                .push(" record_type = ")
                .push_bind(record.record_type)
                .push(", amount = ")
                .push_bind(record.amount)
                .push(", category = ")
                .push_bind(&record.category)
                .push(", note = ")
                .push_bind(&record.note)
                .push(", timestamp = ")
                .push_bind(record.timestamp)
                .push(", image_uri = ")
                .push_bind(&record.image_uri)
                .push(" WHERE id = ")
                .push_bind(record.id)
                .push(" AND user_id = ")
                .push_bind(&record.user_id)
                .build()
                .execute(&mut *conn)
                .await?;
            result.rows_affected()
        };
        if updated == 0 {
            return Err(QueryError::NotFound(Table::Records, record.id.to_string()).into());
        }
        debug!(id = record.id, "record updated");
        self.notify(Change::new(&record.user_id, Table::Records));
        self.retrieve(record.id).await
    }
}

#[async_trait]
impl Delete<Record> for Connection {
    async fn delete(&self, record: Record) -> Result<()> {
        {
            let mut conn = self.lock().await;
            QueryBuilder::<Sqlite>::new("DELETE FROM records WHERE id = ")
                .push_bind(record.id)
                .build()
                .execute(&mut *conn)
                .await?;
        }
        debug!(id = record.id, "record deleted");
        self.notify(Change::new(&record.user_id, Table::Records));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tally_data::{RecordType, User};

    async fn open_with_user() -> Connection {
        let db = Connection::open_test().await;
        db.insert(User::new("alice", "pw", 0)).await.unwrap();
        db
    }

    fn record(category: &str, amount: f64, timestamp: i64) -> Record {
        Record {
            user_id: "alice".to_string(),
            record_type: RecordType::Expense,
            amount,
            category: category.to_string(),
            timestamp,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_record_insert() {
        let db = open_with_user().await;
        let record = db.insert(Record {
            note: "lunch".to_string(),
            image_uri: Some("receipts/1.jpg".to_string()),
            ..record("Food", 23.42, 1000)
        }).await.unwrap();

        assert!(record.id > 0);
        assert_eq!(record.user_id, "alice");
        assert_eq!(record.record_type, RecordType::Expense);
        assert_eq!(record.amount, 23.42);
        assert_eq!(record.category, "Food");
        assert_eq!(record.note, "lunch");
        assert_eq!(record.timestamp, 1000);
        assert_eq!(record.image_uri, Some("receipts/1.jpg".to_string()));
    }

    #[tokio::test]
    async fn test_record_insert_rejects_unknown_user() {
        let db = Connection::open_test().await;
        assert!(db.insert(record("Food", 1.0, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_record_update() {
        let db = open_with_user().await;
        let mut record = db.insert(record("Food", 10.0, 1000)).await.unwrap();
        record.amount = 12.5;
        record.record_type = RecordType::Income;
        record.category = "Salary".to_string();

        let record = db.update(record).await.unwrap();
        assert_eq!(record.amount, 12.5);
        assert_eq!(record.record_type, RecordType::Income);
        assert_eq!(record.category, "Salary");
    }

    #[tokio::test]
    async fn test_record_update_is_scoped_to_owner() {
        let db = open_with_user().await;
        db.insert(User::new("bob", "pw", 0)).await.unwrap();
        let bobs = db.insert(Record {
            user_id: "bob".to_string(),
            ..record("Food", 10.0, 1000)
        }).await.unwrap();

        let result = db.update(Record {
            user_id: "alice".to_string(),
            amount: 999.0,
            ..bobs.clone()
        }).await;
        assert_eq!(
            result.unwrap_err().downcast_ref::<QueryError>(),
            Some(&QueryError::NotFound(Table::Records, bobs.id.to_string()))
        );

        let record: Record = db.retrieve(bobs.id).await.unwrap();
        assert_eq!(record, bobs);
    }

    #[tokio::test]
    async fn test_record_filter() {
        let db = open_with_user().await;
        db.insert(record("Food", 10.0, 1000)).await.unwrap();
        db.insert(record("Food", 20.0, 2000)).await.unwrap();
        db.insert(record("Transport", 5.0, 3000)).await.unwrap();
        db.insert(Record {
            record_type: RecordType::Income,
            ..record("Salary", 100.0, 1500)
        }).await.unwrap();

        // Half open time range
        let records: Vec<Record> = db.query(&RecordFilter {
            user_id: Some("alice".to_string()),
            time_from: Some(1000),
            time_until: Some(3000),
            ..Default::default()
        }).await.unwrap();
        assert_eq!(records.len(), 3);
        // Newest first
        assert_eq!(records[0].timestamp, 2000);

        let records: Vec<Record> = db.query(&RecordFilter {
            record_type: Some(RecordType::Expense),
            category: Some("Food".to_string()),
            ..Default::default()
        }).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_record_delete() {
        let db = open_with_user().await;
        let record = db.insert(record("Food", 10.0, 1000)).await.unwrap();
        let id = record.id;
        db.delete(record).await.unwrap();

        let result: Result<Record> = db.retrieve(id).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_records_cascade_with_user() {
        let db = open_with_user().await;
        db.insert(record("Food", 10.0, 1000)).await.unwrap();
        let user: User = db.retrieve("alice".to_string()).await.unwrap();
        db.delete(user).await.unwrap();

        let records: Vec<Record> = db.query(&RecordFilter::default()).await.unwrap();
        assert!(records.is_empty());
    }
}
