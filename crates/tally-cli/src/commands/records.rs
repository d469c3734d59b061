use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand};

use tally_accounting::{
    aggregator::Aggregator,
    datetime::{now_millis, start_of_day},
    records::{add_record, delete_record, list_records, update_record},
};
use tally_data::{Record, RecordFilter, RecordType};

use crate::commands::{month_arg, record_type_arg};
use crate::formatting::PrintFormatted;
use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum Records {
    /// Add an income or expense
    #[clap(name = "add")]
    Add(AddRecord),
    /// List the records of a month by day
    #[clap(name = "list")]
    List(ListRecords),
    /// Change a record
    #[clap(name = "set")]
    Update(UpdateRecord),
    /// Delete a record
    #[clap(name = "delete")]
    Delete(DeleteRecord),
}

impl Records {
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Records::Add(cmd) => cmd.run(session).await,
            Records::List(cmd) => cmd.run(session).await,
            Records::Update(cmd) => cmd.run(session).await,
            Records::Delete(cmd) => cmd.run(session).await,
        }
    }
}

async fn find_record(session: &Session, id: i64) -> Result<Record> {
    let records = list_records(&session.db, session.user()?, RecordFilter {
        id: Some(id),
        ..Default::default()
    }).await?;
    records
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No record with id {}.", id))
}

#[derive(Args, Debug)]
pub struct AddRecord {
    #[clap(short, long)]
    pub amount: f64,
    #[clap(short, long)]
    pub category: String,
    /// EXPENSE or INCOME
    #[clap(short = 't', long = "type", default_value = "expense")]
    pub record_type: String,
    #[clap(short, long, default_value = "")]
    pub note: String,
    /// Defaults to now
    #[clap(short, long)]
    pub date: Option<NaiveDate>,
    #[clap(long)]
    pub image: Option<String>,
}

impl AddRecord {
    pub async fn run(self, session: &Session) -> Result<()> {
        let record_type: RecordType = self.record_type.parse().map_err(anyhow::Error::msg)?;
        let timestamp = match self.date {
            Some(date) => start_of_day(&Local, date),
            None => now_millis(),
        };
        let record = add_record(&session.db, Record {
            user_id: session.user()?.to_string(),
            record_type,
            amount: self.amount,
            category: self.category,
            note: self.note,
            timestamp,
            image_uri: self.image,
            ..Default::default()
        }).await?;

        println!();
        record.print_formatted();
        println!();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ListRecords {
    /// YYYY-MM, defaults to the current month
    #[clap(short, long)]
    pub month: Option<String>,
    #[clap(short = 't', long = "type")]
    pub record_type: Option<String>,
    #[clap(short, long)]
    pub category: Option<String>,
}

impl ListRecords {
    pub async fn run(self, session: &Session) -> Result<()> {
        let month = month_arg(&self.month);
        let record_type = record_type_arg(&self.record_type)?;
        let aggregator = Aggregator::new(session.db.clone());
        let days = aggregator
            .records_by_day(session.user()?, &month, record_type, self.category.as_deref())
            .await?;

        let count: usize = days.iter().map(|d| d.records.len()).sum();
        println!("{} records in {}.", count, month);
        println!();
        days.print_formatted();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct UpdateRecord {
    #[clap(short, long)]
    pub id: i64,
    #[clap(short, long)]
    pub amount: Option<f64>,
    #[clap(short, long)]
    pub category: Option<String>,
    #[clap(short = 't', long = "type")]
    pub record_type: Option<String>,
    #[clap(short, long)]
    pub note: Option<String>,
    #[clap(short, long)]
    pub date: Option<NaiveDate>,
}

impl UpdateRecord {
    pub async fn run(self, session: &Session) -> Result<()> {
        let mut record = find_record(session, self.id).await?;
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
        if let Some(record_type) = record_type_arg(&self.record_type)? {
            record.record_type = record_type;
        }
        if let Some(note) = self.note {
            record.note = note;
        }
        if let Some(date) = self.date {
            record.timestamp = start_of_day(&Local, date);
        }

        let record = update_record(&session.db, session.user()?, record).await?;
        println!();
        record.print_formatted();
        println!();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteRecord {
    #[clap(short, long)]
    pub id: i64,
}

impl DeleteRecord {
    pub async fn run(self, session: &Session) -> Result<()> {
        let record = find_record(session, self.id).await?;
        println!();
        record.print_formatted();
        println!();
        if !session.confirm("Delete record?")? {
            return Ok(());
        }
        delete_record(&session.db, &record.user_id, record.id).await?;
        Ok(())
    }
}
