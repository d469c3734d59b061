use std::io::Write;

use anyhow::Result;
use chrono::{Local, TimeZone};
use csv::WriterBuilder;
use serde::Serialize;
use tracing::info;

use tally_data::{Query, Record, RecordFilter, RecordType};

/// One line of the CSV export.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    date: String,
    #[serde(rename = "type")]
    record_type: &'static str,
    category: &'a str,
    amount: String,
    note: &'a str,
}

fn type_label(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::Expense => "Expense",
        RecordType::Income => "Income",
    }
}

/// Write records as CSV with a header line. Dates are
/// formatted in the given time zone.
pub fn write_csv<W, Tz>(records: &[Record], tz: &Tz, writer: W) -> Result<()>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut wr = WriterBuilder::new().from_writer(writer);
    for record in records {
        let date = tz
            .timestamp_millis_opt(record.timestamp)
            .single()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        wr.serialize(CsvRow {
            date,
            record_type: type_label(record.record_type),
            category: &record.category,
            amount: format!("{:.2}", record.amount),
            note: &record.note,
        })?;
    }
    wr.flush()?;
    Ok(())
}

/// Export all records of a user as CSV, newest first.
/// Returns the number of exported records.
pub async fn export_csv<DB, W>(db: &DB, user_id: &str, writer: W) -> Result<usize>
where
    DB: Query<Record, Filter = RecordFilter> + Send + Sync,
    W: Write,
{
    let records = db
        .query(&RecordFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        })
        .await?;
    write_csv(&records, &Local, writer)?;
    info!(user_id, count = records.len(), "exported records");
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;

    use tally_data::{Insert, User};
    use tally_db::Connection;

    fn record(record_type: RecordType, category: &str, amount: f64, note: &str) -> Record {
        Record {
            user_id: "alice".to_string(),
            record_type,
            amount,
            category: category.to_string(),
            note: note.to_string(),
            // 2025-01-02 08:30 UTC
            timestamp: 1735806600000,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_csv() {
        let records = vec![
            record(RecordType::Income, "Salary", 3000.0, ""),
            record(RecordType::Expense, "Food", 12.5, "lunch, with \"friends\""),
        ];
        let mut out = vec![];
        write_csv(&records, &Utc, &mut out).unwrap();
        let csv = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            "date,type,category,amount,note",
            "2025-01-02 08:30,Income,Salary,3000.00,",
            "2025-01-02 08:30,Expense,Food,12.50,\"lunch, with \"\"friends\"\"\"",
        ]);
    }

    #[test]
    fn test_write_csv_empty() {
        let mut out = vec![];
        write_csv(&[], &Utc, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_export_csv() {
        let db = Connection::open_test().await;
        db.insert(User::new("alice", "pw", 0)).await.unwrap();
        db.insert(User::new("bob", "pw", 0)).await.unwrap();
        db.insert(Record { timestamp: 1000, ..record(RecordType::Expense, "Old", 1.0, "") })
            .await
            .unwrap();
        db.insert(Record { timestamp: 2000, ..record(RecordType::Expense, "New", 2.0, "") })
            .await
            .unwrap();
        db.insert(Record { user_id: "bob".to_string(), ..record(RecordType::Expense, "Bob", 3.0, "") })
            .await
            .unwrap();

        let mut out = vec![];
        let count = export_csv(&db, "alice", &mut out).await.unwrap();
        assert_eq!(count, 2);

        let csv = String::from_utf8(out).unwrap();
        let categories: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(2).unwrap())
            .collect();
        assert_eq!(categories, vec!["New", "Old"]);
    }
}
