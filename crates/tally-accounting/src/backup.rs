//! JSON backups of a user's ledger.
//!
//! A backup holds every record, budget and category of one
//! user. Restoring it replaces the user's data as a whole.

use std::io::{Read, Write};

use anyhow::Result;
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing::info;

use tally_data::{
    Budget, BudgetFilter, Category, CategoryFilter, Query, Record, RecordFilter,
    Replace, UserData,
};

use crate::datetime::now_millis;

/// The newest backup format this crate reads and writes.
pub const BACKUP_VERSION: u32 = 1;

#[derive(ThisError, Debug, Clone, PartialEq)]
pub enum BackupError {
    #[error("unsupported backup version {0}")]
    UnsupportedVersion(u32),
    #[error("backup belongs to another user: {0}")]
    DifferentUser(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub version: u32,
    /// Milliseconds since the unix epoch
    pub backup_time: i64,
    pub user_id: String,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Backup {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Can this backup be restored for the user?
    pub fn validate(&self, user_id: &str) -> Result<(), BackupError> {
        if self.version > BACKUP_VERSION {
            return Err(BackupError::UnsupportedVersion(self.version));
        }
        if self.user_id != user_id {
            return Err(BackupError::DifferentUser(self.user_id.clone()));
        }
        Ok(())
    }

    /// Suggested file name, like `tally_backup_20250131_184502.json`.
    pub fn file_name(&self) -> String {
        let time = Local
            .timestamp_millis_opt(self.backup_time)
            .single()
            .unwrap_or_else(Local::now);
        format!("tally_backup_{}.json", time.format("%Y%m%d_%H%M%S"))
    }
}

/// Collect all data of a user into a backup.
pub async fn export_backup<DB>(db: &DB, user_id: &str) -> Result<Backup>
where
    DB: Query<Record, Filter = RecordFilter>
        + Query<Budget, Filter = BudgetFilter>
        + Query<Category, Filter = CategoryFilter>
        + Send
        + Sync,
{
    let records = Query::<Record>::query(
        db,
        &RecordFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        },
    )
    .await?;
    let budgets = Query::<Budget>::query(
        db,
        &BudgetFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        },
    )
    .await?;
    let categories = Query::<Category>::query(
        db,
        &CategoryFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        },
    )
    .await?;

    Ok(Backup {
        version: BACKUP_VERSION,
        backup_time: now_millis(),
        user_id: user_id.to_string(),
        records,
        budgets,
        categories,
    })
}

/// Replace all data of the user with the contents of the
/// backup. The backup may come from another user, callers
/// decide about that with `Backup::validate`. Only the
/// version is enforced here.
pub async fn restore_backup<DB>(db: &DB, user_id: &str, backup: Backup) -> Result<()>
where
    DB: Replace + Send + Sync,
{
    if backup.version > BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(backup.version).into());
    }
    info!(
        user_id,
        from = %backup.user_id,
        records = backup.records.len(),
        budgets = backup.budgets.len(),
        categories = backup.categories.len(),
        "restoring backup"
    );
    let data = UserData {
        records: backup.records,
        budgets: backup.budgets,
        categories: backup.categories,
    };
    db.replace(user_id, data).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use tally_data::{Insert, RecordType};
    use tally_db::Connection;

    use crate::budget::BudgetTracker;
    use crate::categories::{add_custom_category, list_categories};
    use crate::datetime::Month;
    use crate::records::{add_record, list_records};
    use crate::users::register;

    async fn ledger() -> Connection {
        let db = Connection::open_test().await;
        register(&db, "alice", "secret").await.unwrap();
        register(&db, "bob", "secret").await.unwrap();

        for (category, amount) in [("Food", 12.5), ("Transport", 3.0)] {
            add_record(&db, Record {
                user_id: "alice".to_string(),
                record_type: RecordType::Expense,
                amount,
                category: category.to_string(),
                timestamp: 1735689600000,
                ..Default::default()
            }).await.unwrap();
        }
        add_custom_category(&db, "alice", "Pets", RecordType::Expense, None)
            .await
            .unwrap();
        let tracker = BudgetTracker::new(db.clone());
        let month: Month = "2025-01".parse().unwrap();
        tracker.set_total_budget("alice", &month, 1000.0).await.unwrap();
        tracker
            .set_category_budget("alice", &month, "Food", 300.0)
            .await
            .unwrap();
        db
    }

    fn backup(version: u32, user_id: &str) -> Backup {
        Backup {
            version,
            backup_time: 0,
            user_id: user_id.to_string(),
            records: vec![],
            budgets: vec![],
            categories: vec![],
        }
    }

    #[test]
    fn test_validate() {
        assert_eq!(backup(1, "alice").validate("alice"), Ok(()));
        assert_eq!(
            backup(2, "alice").validate("alice"),
            Err(BackupError::UnsupportedVersion(2))
        );
        assert_eq!(
            backup(1, "bob").validate("alice"),
            Err(BackupError::DifferentUser("bob".to_string()))
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "version": 1,
            "backup_time": 1735689600000,
            "user_id": "alice",
            "records": [{
                "id": 7,
                "user_id": "alice",
                "record_type": "EXPENSE",
                "amount": 9.5,
                "category": "Food",
                "note": "",
                "timestamp": 1735689600000,
                "image_uri": null
            }]
        }"#;
        let backup = Backup::from_json(json).unwrap();
        assert_eq!(backup.records.len(), 1);
        assert_eq!(backup.records[0].record_type, RecordType::Expense);
        assert!(backup.budgets.is_empty());

        assert!(Backup::from_json("{\"version\": 1}").is_err());
        assert!(Backup::from_json("not json").is_err());
    }

    #[test]
    fn test_file_name() {
        let name = backup(1, "alice").file_name();
        assert!(name.starts_with("tally_backup_"));
        assert!(name.ends_with(".json"));
    }

    struct DiskFull;

    impl Write for DiskFull {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_write_to_reports_io_errors() {
        let backup = backup(BACKUP_VERSION, "alice");
        assert!(backup.write_to(std::io::BufWriter::new(DiskFull)).is_err());
        assert!(backup.write_to(DiskFull).is_err());
    }

    #[tokio::test]
    async fn test_export_backup() {
        let db = ledger().await;
        let backup = export_backup(&db, "alice").await.unwrap();
        assert_eq!(backup.version, BACKUP_VERSION);
        assert_eq!(backup.user_id, "alice");
        assert_eq!(backup.records.len(), 2);
        assert_eq!(backup.budgets.len(), 2);
        assert_eq!(backup.categories.len(), 16);

        let json = backup.to_json().unwrap();
        assert!(json.contains("\"backup_time\""));
        let mut buf = vec![];
        backup.write_to(&mut buf).unwrap();
        assert_eq!(Backup::read_from(buf.as_slice()).unwrap(), backup);
    }

    #[tokio::test]
    async fn test_restore_backup() {
        let db = ledger().await;
        let saved = export_backup(&db, "alice").await.unwrap();

        // Change things after the backup was taken
        add_record(&db, Record {
            user_id: "alice".to_string(),
            amount: 99.0,
            category: "Food".to_string(),
            ..Default::default()
        }).await.unwrap();
        add_custom_category(&db, "alice", "Garden", RecordType::Expense, None)
            .await
            .unwrap();

        restore_backup(&db, "alice", saved.clone()).await.unwrap();

        let restored = export_backup(&db, "alice").await.unwrap();
        assert_eq!(restored.records.len(), saved.records.len());
        assert_eq!(restored.budgets.len(), saved.budgets.len());
        assert_eq!(restored.categories.len(), saved.categories.len());
        let mut amounts: Vec<f64> = restored.records.iter().map(|r| r.amount).collect();
        amounts.sort_by(f64::total_cmp);
        assert_eq!(amounts, vec![3.0, 12.5]);

        // Bob is untouched
        assert_eq!(list_categories(&db, "bob", None).await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_restore_backup_of_other_user() {
        let db = ledger().await;
        let saved = export_backup(&db, "alice").await.unwrap();
        assert!(saved.validate("bob").is_err());

        restore_backup(&db, "bob", saved).await.unwrap();
        let records = list_records(&db, "bob", RecordFilter::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.user_id == "bob"));
    }

    #[tokio::test]
    async fn test_restore_rejects_newer_version() {
        let db = ledger().await;
        let mut saved = export_backup(&db, "alice").await.unwrap();
        saved.version = 2;
        saved.records.clear();

        let err = restore_backup(&db, "alice", saved).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<BackupError>(),
            Some(&BackupError::UnsupportedVersion(2))
        );
        let records = list_records(&db, "alice", RecordFilter::default())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_restore_empty_backup() {
        let db = Connection::open_test().await;
        db.insert(tally_data::User::new("carol", "pw", 0)).await.unwrap();
        let saved = export_backup(&db, "carol").await.unwrap();
        assert!(saved.records.is_empty());
        restore_backup(&db, "carol", saved).await.unwrap();
        assert!(export_backup(&db, "carol").await.unwrap().categories.is_empty());
    }
}
