use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use tally_db::{schema, Connection};

mod cli;
mod commands;
mod formatting;
mod session;

use cli::{Cli, Command};
use session::Session;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::init();
    init_tracing();

    let conn = Connection::open(&cli.ledger_db).await?;
    schema::install(&conn).await?;

    let session = Session::new(conn, cli.user, cli.yes);
    match cli.command {
        Command::User(cmd) => cmd.run(&session).await,
        Command::Record(cmd) => cmd.run(&session).await,
        Command::Category(cmd) => cmd.run(&session).await,
        Command::Budget(cmd) => cmd.run(&session).await,
        Command::Stats(cmd) => cmd.run(&session).await,
        Command::Backup(cmd) => cmd.run(&session).await,
        Command::Export(cmd) => cmd.run(&session).await,
    }?;

    Ok(())
}
