//! Monthly statistics over the ledger.
//!
//! All figures are computed on demand from the records of one
//! user within a month range and are never persisted.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use chrono::{Local, NaiveDate, TimeZone};

use tally_data::{
    CategoryStat, CategoryStatWithCount, DailyStat, Query, Record, RecordFilter,
    RecordType,
};

use crate::datetime::{local_date, Month};

/// Income and expense of one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub month: Month,
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

/// The records of a single day with their totals.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRecords {
    pub date: NaiveDate,
    pub income: f64,
    pub expense: f64,
    /// Newest first
    pub records: Vec<Record>,
}

/// Add up amounts. The values are summed in ascending order
/// so the result does not depend on the row order.
pub fn sum<I>(amounts: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut amounts: Vec<f64> = amounts.into_iter().collect();
    amounts.sort_by(f64::total_cmp);
    amounts.into_iter().fold(0.0, |total, amount| total + amount)
}

/// Group records by category with their totals and counts,
/// largest total first. Equal totals are ordered by name.
pub fn group_by_category(records: &[Record]) -> Vec<CategoryStatWithCount> {
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for record in records {
        groups
            .entry(record.category.as_str())
            .or_default()
            .push(record.amount);
    }

    let mut stats: Vec<CategoryStatWithCount> = groups
        .into_iter()
        .map(|(category, amounts)| CategoryStatWithCount {
            category: category.to_string(),
            count: amounts.len() as u32,
            total: sum(amounts),
        })
        .collect();
    stats.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });
    stats
}

/// Group records by their local day of month, in day order.
pub fn group_by_day<Tz: TimeZone>(records: &[Record], tz: &Tz) -> Vec<DailyStat> {
    let mut days: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let Some(date) = local_date(tz, record.timestamp) {
            days.entry(date).or_default().push(record.amount);
        }
    }

    days.into_iter()
        .map(|(date, amounts)| DailyStat {
            day: date.format("%d").to_string(),
            total: sum(amounts),
        })
        .collect()
}

/// Group records by local date, newest day first.
pub fn group_records_by_day<Tz: TimeZone>(
    records: Vec<Record>,
    tz: &Tz,
) -> Vec<DayRecords> {
    let mut days: BTreeMap<NaiveDate, Vec<Record>> = BTreeMap::new();
    for record in records {
        if let Some(date) = local_date(tz, record.timestamp) {
            days.entry(date).or_default().push(record);
        }
    }

    days.into_iter()
        .rev()
        .map(|(date, mut records)| {
            records.sort_by(|a, b| {
                b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
            });
            let total_of = |record_type: RecordType| {
                sum(records
                    .iter()
                    .filter(|r| r.record_type == record_type)
                    .map(|r| r.amount))
            };
            DayRecords {
                date,
                income: total_of(RecordType::Income),
                expense: total_of(RecordType::Expense),
                records,
            }
        })
        .collect()
}

/// Computes monthly statistics from a ledger store.
/// Month boundaries and days are taken in the time zone
/// of the aggregator, local time unless given otherwise.
#[derive(Debug, Clone)]
pub struct Aggregator<DB, Tz: TimeZone = Local> {
    db: DB,
    tz: Tz,
}

impl<DB> Aggregator<DB, Local> {
    pub fn new(db: DB) -> Self {
        Self { db, tz: Local }
    }
}

impl<DB, Tz> Aggregator<DB, Tz>
where
    DB: Query<Record, Filter = RecordFilter> + Send + Sync,
    Tz: TimeZone + Send + Sync,
{
    pub fn with_timezone(db: DB, tz: Tz) -> Self {
        Self { db, tz }
    }

    pub fn db(&self) -> &DB {
        &self.db
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Records of a user within the month, newest first.
    pub async fn month_records(
        &self,
        user_id: &str,
        month: &Month,
        record_type: Option<RecordType>,
        category: Option<&str>,
    ) -> Result<Vec<Record>> {
        let (time_from, time_until) = month.range_in(&self.tz);
        let filter = RecordFilter {
            user_id: Some(user_id.to_string()),
            record_type,
            category: category.map(|c| c.to_string()),
            time_from: Some(time_from),
            time_until: Some(time_until),
            ..Default::default()
        };
        self.db.query(&filter).await
    }

    /// Sum of all amounts of the given type in the month.
    pub async fn monthly_total(
        &self,
        user_id: &str,
        month: &Month,
        record_type: RecordType,
    ) -> Result<f64> {
        let records = self
            .month_records(user_id, month, Some(record_type), None)
            .await?;
        Ok(sum(records.iter().map(|r| r.amount)))
    }

    /// Totals per category, largest first.
    pub async fn category_stats(
        &self,
        user_id: &str,
        month: &Month,
        record_type: RecordType,
    ) -> Result<Vec<CategoryStat>> {
        let stats = self
            .category_stats_with_count(user_id, month, record_type)
            .await?;
        Ok(stats.into_iter().map(CategoryStat::from).collect())
    }

    /// Totals and record counts per category, largest first.
    pub async fn category_stats_with_count(
        &self,
        user_id: &str,
        month: &Month,
        record_type: RecordType,
    ) -> Result<Vec<CategoryStatWithCount>> {
        let records = self
            .month_records(user_id, month, Some(record_type), None)
            .await?;
        Ok(group_by_category(&records))
    }

    /// Totals per day of the month, in day order.
    pub async fn daily_stats(
        &self,
        user_id: &str,
        month: &Month,
        record_type: RecordType,
    ) -> Result<Vec<DailyStat>> {
        let records = self
            .month_records(user_id, month, Some(record_type), None)
            .await?;
        Ok(group_by_day(&records, &self.tz))
    }

    /// Expense of a single category in the month.
    pub async fn category_expense(
        &self,
        user_id: &str,
        month: &Month,
        category: &str,
    ) -> Result<f64> {
        let records = self
            .month_records(user_id, month, Some(RecordType::Expense), Some(category))
            .await?;
        Ok(sum(records.iter().map(|r| r.amount)))
    }

    pub async fn monthly_summary(
        &self,
        user_id: &str,
        month: &Month,
    ) -> Result<MonthlySummary> {
        let records = self.month_records(user_id, month, None, None).await?;
        let total_of = |record_type: RecordType| {
            sum(records
                .iter()
                .filter(|r| r.record_type == record_type)
                .map(|r| r.amount))
        };
        let income = total_of(RecordType::Income);
        let expense = total_of(RecordType::Expense);
        Ok(MonthlySummary {
            month: *month,
            income,
            expense,
            balance: income - expense,
        })
    }

    /// Records of the month grouped by day, optionally
    /// narrowed down to a type and category.
    pub async fn records_by_day(
        &self,
        user_id: &str,
        month: &Month,
        record_type: Option<RecordType>,
        category: Option<&str>,
    ) -> Result<Vec<DayRecords>> {
        let records = self
            .month_records(user_id, month, record_type, category)
            .await?;
        Ok(group_records_by_day(records, &self.tz))
    }
}
