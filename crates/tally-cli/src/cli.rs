use clap::{Parser, Subcommand};

use crate::commands::{
    Backups, Budgets, Categories, Exports, Records, Stats, Users,
};

#[derive(Parser, Debug)]
#[clap(name = "tally", version=env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[clap(long, env = "TALLY_DB", default_value = "tally.sqlite3")]
    pub ledger_db: String,

    /// The user owning the ledger
    #[clap(short, long, env = "TALLY_USER", global = true)]
    pub user: Option<String>,

    /// Do not ask before destructive changes
    #[clap(short, long, global = true)]
    pub yes: bool,

    #[clap(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn init() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register and remove users
    #[clap(subcommand, name = "user")]
    User(Users),
    /// Add, list and remove records
    #[clap(subcommand, name = "record")]
    Record(Records),
    /// Manage categories
    #[clap(subcommand, name = "category")]
    Category(Categories),
    /// Monthly budgets
    #[clap(subcommand, name = "budget")]
    Budget(Budgets),
    /// Monthly statistics
    #[clap(subcommand, name = "stats")]
    Stats(Stats),
    /// Save and restore JSON backups
    #[clap(subcommand, name = "backup")]
    Backup(Backups),
    /// Export records
    #[clap(subcommand, name = "export")]
    Export(Exports),
}
