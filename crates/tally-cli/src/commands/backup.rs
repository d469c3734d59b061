use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use chrono::{Local, TimeZone};

use tally_accounting::backup::{export_backup, restore_backup, Backup, BackupError};
use tally_accounting::export::export_csv;

use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum Backups {
    /// Write all data of the user to a JSON file
    #[clap(name = "export")]
    Export(ExportBackup),
    /// Replace all data of the user from a JSON file
    #[clap(name = "import")]
    Import(ImportBackup),
}

impl Backups {
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Backups::Export(cmd) => cmd.run(session).await,
            Backups::Import(cmd) => cmd.run(session).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportBackup {
    /// Defaults to a timestamped file in the current directory
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportBackup {
    pub async fn run(self, session: &Session) -> Result<()> {
        let backup = export_backup(&session.db, session.user()?).await?;
        let path = self.output.unwrap_or_else(|| PathBuf::from(backup.file_name()));
        backup.write_to(BufWriter::new(File::create(&path)?))?;
        println!(
            "Saved {} records, {} budgets and {} categories to {}.",
            backup.records.len(),
            backup.budgets.len(),
            backup.categories.len(),
            path.display(),
        );
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ImportBackup {
    pub input: PathBuf,
}

impl ImportBackup {
    pub async fn run(self, session: &Session) -> Result<()> {
        let user_id = session.user()?;
        let backup = Backup::read_from(BufReader::new(File::open(&self.input)?))?;

        match backup.validate(user_id) {
            Ok(()) => {}
            Err(BackupError::DifferentUser(other)) => {
                let message = format!("The backup belongs to {}. Restore anyway?", other);
                if !session.confirm(&message)? {
                    return Ok(());
                }
            }
            Err(err) => return Err(err.into()),
        }

        let taken = Local
            .timestamp_millis_opt(backup.backup_time)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "Backup from {}: {} records, {} budgets, {} categories.",
            taken,
            backup.records.len(),
            backup.budgets.len(),
            backup.categories.len(),
        );
        if !session.confirm("Replace all current data with the backup?")? {
            return Ok(());
        }
        restore_backup(&session.db, user_id, backup).await?;
        println!("Backup restored.");
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Exports {
    /// Write the records of the user as CSV
    #[clap(name = "csv")]
    Csv(ExportCsv),
}

impl Exports {
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Exports::Csv(cmd) => cmd.run(session).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportCsv {
    /// Defaults to stdout
    #[clap(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportCsv {
    pub async fn run(self, session: &Session) -> Result<()> {
        let user_id = session.user()?;
        match self.output {
            Some(path) => {
                let count = export_csv(&session.db, user_id, BufWriter::new(File::create(&path)?)).await?;
                println!("Exported {} records to {}.", count, path.display());
            }
            None => {
                export_csv(&session.db, user_id, io::stdout().lock()).await?;
            }
        }
        Ok(())
    }
}
