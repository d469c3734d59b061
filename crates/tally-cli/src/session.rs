use anyhow::{anyhow, Result};
use inquire::Confirm;

use tally_db::Connection;

/// Everything a command needs: the ledger, the acting
/// user and whether to skip confirmations.
pub struct Session {
    pub db: Connection,
    user: Option<String>,
    yes: bool,
}

impl Session {
    pub fn new(db: Connection, user: Option<String>, yes: bool) -> Self {
        Self { db, user, yes }
    }

    /// The acting user, required by most commands.
    pub fn user(&self) -> Result<&str> {
        self.user
            .as_deref()
            .ok_or_else(|| anyhow!("No user given, use --user or set TALLY_USER."))
    }

    /// Ask before a destructive change, unless --yes was given.
    pub fn confirm(&self, message: &str) -> Result<bool> {
        if self.yes {
            return Ok(true);
        }
        let confirm = Confirm::new(message).with_default(false);
        Ok(confirm.prompt()?)
    }
}
