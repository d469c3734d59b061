use anyhow::Result;
use tracing::{debug, info};

use tally_data::{
    validate_amount, validate_category_name, Delete, Insert, Query, Record,
    RecordFilter, Update,
};

/// Check and normalize a record before it is stored.
fn validate(record: Record) -> Result<Record> {
    Ok(Record {
        amount: validate_amount(record.amount)?,
        category: validate_category_name(&record.category)?,
        ..record
    })
}

/// Store a new record after checking amount and category.
pub async fn add_record<DB>(db: &DB, record: Record) -> Result<Record>
where
    DB: Insert<Record> + Send + Sync,
{
    let record = db.insert(validate(record)?).await?;
    info!(
        id = record.id,
        user_id = %record.user_id,
        record_type = %record.record_type,
        amount = record.amount,
        "added record"
    );
    Ok(record)
}

/// Change a stored record of the user, with the same checks
/// as `add_record`. Records of other users are not found.
pub async fn update_record<DB>(db: &DB, user_id: &str, record: Record) -> Result<Record>
where
    DB: Update<Record> + Send + Sync,
{
    let record = Record {
        user_id: user_id.to_string(),
        ..validate(record)?
    };
    let record = db.update(record).await?;
    debug!(id = record.id, user_id, "updated record");
    Ok(record)
}

/// Delete a record of the user. Absent records are ignored.
pub async fn delete_record<DB>(db: &DB, user_id: &str, id: i64) -> Result<()>
where
    DB: Query<Record, Filter = RecordFilter> + Delete<Record> + Send + Sync,
{
    let records = db
        .query(&RecordFilter {
            id: Some(id),
            user_id: Some(user_id.to_string()),
            ..Default::default()
        })
        .await?;
    if records.is_empty() {
        debug!(id, "no such record");
    }
    for record in records {
        db.delete(record).await?;
    }
    Ok(())
}

/// All records of a user matching the filter, newest first.
pub async fn list_records<DB>(
    db: &DB,
    user_id: &str,
    filter: RecordFilter,
) -> Result<Vec<Record>>
where
    DB: Query<Record, Filter = RecordFilter> + Send + Sync,
{
    db.query(&RecordFilter {
        user_id: Some(user_id.to_string()),
        ..filter
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    use tally_data::{RecordType, Table, User, ValidationError};
    use tally_db::{Connection, QueryError};

    async fn open() -> Connection {
        let db = Connection::open_test().await;
        db.insert(User::new("alice", "pw", 0)).await.unwrap();
        db.insert(User::new("bob", "pw", 0)).await.unwrap();
        db
    }

    fn lunch() -> Record {
        Record {
            user_id: "alice".to_string(),
            record_type: RecordType::Expense,
            amount: 12.5,
            category: " Food ".to_string(),
            note: "lunch".to_string(),
            timestamp: 1000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_record() {
        let db = open().await;
        let record = add_record(&db, lunch()).await.unwrap();
        assert!(record.id > 0);
        assert_eq!(record.category, "Food");
        assert_eq!(record.note, "lunch");
    }

    #[tokio::test]
    async fn test_add_record_rejects() {
        let db = open().await;
        let err = add_record(&db, Record { amount: 0.0, ..lunch() })
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::NonPositiveAmount(0.0))
        );

        let err = add_record(&db, Record { category: "".to_string(), ..lunch() })
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::EmptyCategory)
        );

        let records = list_records(&db, "alice", RecordFilter::default())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_update_record() {
        let db = open().await;
        let record = add_record(&db, lunch()).await.unwrap();

        let record = update_record(&db, "alice", Record { amount: 20.0, ..record })
            .await
            .unwrap();
        assert_eq!(record.amount, 20.0);

        let err = update_record(&db, "alice", Record { amount: -1.0, ..record })
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_some());
    }

    #[tokio::test]
    async fn test_update_record_of_other_user() {
        let db = open().await;
        let bobs = add_record(&db, Record { user_id: "bob".to_string(), ..lunch() })
            .await
            .unwrap();

        let err = update_record(
            &db,
            "alice",
            Record {
                amount: 999.0,
                category: "Other".to_string(),
                ..bobs.clone()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<QueryError>(),
            Some(&QueryError::NotFound(Table::Records, bobs.id.to_string()))
        );

        let records = list_records(&db, "bob", RecordFilter::default())
            .await
            .unwrap();
        assert_eq!(records, vec![bobs]);
    }

    #[tokio::test]
    async fn test_delete_record() {
        let db = open().await;
        let record = add_record(&db, lunch()).await.unwrap();

        delete_record(&db, "bob", record.id).await.unwrap();
        let records = list_records(&db, "alice", RecordFilter::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 1);

        delete_record(&db, "alice", record.id).await.unwrap();
        delete_record(&db, "alice", record.id).await.unwrap();
        let records = list_records(&db, "alice", RecordFilter::default())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_list_records_is_scoped_to_user() {
        let db = open().await;
        add_record(&db, lunch()).await.unwrap();
        add_record(&db, Record { timestamp: 2000, ..lunch() }).await.unwrap();
        add_record(&db, Record { user_id: "bob".to_string(), ..lunch() })
            .await
            .unwrap();

        // The filter can not select another user
        let filter = RecordFilter {
            user_id: Some("bob".to_string()),
            ..Default::default()
        };
        let records = list_records(&db, "alice", filter).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, 2000);
    }
}
