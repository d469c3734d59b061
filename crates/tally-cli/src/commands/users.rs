use anyhow::Result;
use clap::{Args, Subcommand};
use inquire::Password;

use tally_accounting::users::{authenticate, delete_user, login_or_register, register};

use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum Users {
    /// Register the user given with --user
    #[clap(name = "register")]
    Register(RegisterUser),
    /// Check the password, registering unknown users
    #[clap(name = "login")]
    Login(LoginUser),
    /// Delete the user and all of its data
    #[clap(name = "delete")]
    Delete(DeleteUser),
}

impl Users {
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Users::Register(cmd) => cmd.run(session).await,
            Users::Login(cmd) => cmd.run(session).await,
            Users::Delete(cmd) => cmd.run(session).await,
        }
    }
}

/// Take the password from the command line or ask for it.
fn password(password: Option<String>) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(Password::new("Password:").prompt()?),
    }
}

#[derive(Args, Debug)]
pub struct RegisterUser {
    #[clap(short, long)]
    pub password: Option<String>,
}

impl RegisterUser {
    pub async fn run(self, session: &Session) -> Result<()> {
        let user_id = session.user()?;
        let password = password(self.password)?;
        let user = register(&session.db, user_id, &password).await?;
        println!("User {} registered.", user.id);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct LoginUser {
    #[clap(short, long)]
    pub password: Option<String>,
    /// Fail for unknown users instead of registering them
    #[clap(long)]
    pub no_register: bool,
}

impl LoginUser {
    pub async fn run(self, session: &Session) -> Result<()> {
        let user_id = session.user()?;
        let password = password(self.password)?;
        let user = if self.no_register {
            authenticate(&session.db, user_id, &password).await?
        } else {
            login_or_register(&session.db, user_id, &password).await?
        };
        println!("Logged in as {}.", user.id);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteUser {}

impl DeleteUser {
    pub async fn run(self, session: &Session) -> Result<()> {
        let user_id = session.user()?;
        let message = format!("Delete user {} with all records and budgets?", user_id);
        if !session.confirm(&message)? {
            return Ok(());
        }
        delete_user(&session.db, user_id).await?;
        println!("User {} deleted.", user_id);
        Ok(())
    }
}
