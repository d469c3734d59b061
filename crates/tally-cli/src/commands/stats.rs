use anyhow::Result;
use clap::{Args, Subcommand};

use tally_accounting::aggregator::Aggregator;
use tally_data::RecordType;

use crate::commands::{month_arg, record_type_arg};
use crate::formatting::PrintFormatted;
use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum Stats {
    /// Income, expense and balance of a month
    #[clap(name = "summary")]
    Summary(StatsArgs),
    /// Totals per category
    #[clap(name = "categories")]
    Categories(StatsArgs),
    /// Categories ranked by total with counts and shares
    #[clap(name = "ranking")]
    Ranking(StatsArgs),
    /// Totals per day
    #[clap(name = "daily")]
    Daily(StatsArgs),
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// YYYY-MM, defaults to the current month
    #[clap(short, long)]
    pub month: Option<String>,
    /// EXPENSE or INCOME, ignored by summary
    #[clap(short = 't', long = "type")]
    pub record_type: Option<String>,
}

impl Stats {
    pub async fn run(self, session: &Session) -> Result<()> {
        let user_id = session.user()?;
        let aggregator = Aggregator::new(session.db.clone());

        match self {
            Stats::Summary(args) => {
                let month = month_arg(&args.month);
                let summary = aggregator.monthly_summary(user_id, &month).await?;
                summary.print_formatted();
            }
            Stats::Categories(args) => {
                let month = month_arg(&args.month);
                let record_type = record_type_arg(&args.record_type)?
                    .unwrap_or(RecordType::Expense);
                let stats = aggregator.category_stats(user_id, &month, record_type).await?;
                println!("{} by category in {}:", record_type, month);
                stats.print_formatted();
            }
            Stats::Ranking(args) => {
                let month = month_arg(&args.month);
                let record_type = record_type_arg(&args.record_type)?
                    .unwrap_or(RecordType::Expense);
                let stats = aggregator
                    .category_stats_with_count(user_id, &month, record_type)
                    .await?;
                stats.print_formatted();
            }
            Stats::Daily(args) => {
                let month = month_arg(&args.month);
                let record_type = record_type_arg(&args.record_type)?
                    .unwrap_or(RecordType::Expense);
                let stats = aggregator.daily_stats(user_id, &month, record_type).await?;
                println!("{} per day in {}:", record_type, month);
                stats.print_formatted();
            }
        }
        Ok(())
    }
}
