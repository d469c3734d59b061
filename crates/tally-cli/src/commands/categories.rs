use anyhow::Result;
use clap::{Args, Subcommand};

use tally_accounting::categories::{add_custom_category, delete_category, list_categories};
use tally_data::RecordType;

use crate::commands::record_type_arg;
use crate::formatting::PrintFormatted;
use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum Categories {
    /// List categories
    #[clap(name = "list")]
    List(ListCategories),
    /// Add a custom category
    #[clap(name = "add")]
    Add(AddCategory),
    /// Delete a category
    #[clap(name = "delete")]
    Delete(DeleteCategory),
}

impl Categories {
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Categories::List(cmd) => cmd.run(session).await,
            Categories::Add(cmd) => cmd.run(session).await,
            Categories::Delete(cmd) => cmd.run(session).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListCategories {
    #[clap(short = 't', long = "type")]
    pub record_type: Option<String>,
}

impl ListCategories {
    pub async fn run(self, session: &Session) -> Result<()> {
        let record_type = record_type_arg(&self.record_type)?;
        let categories = list_categories(&session.db, session.user()?, record_type).await?;
        println!("{} categories.", categories.len());
        categories.print_formatted();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct AddCategory {
    #[clap(short, long)]
    pub name: String,
    #[clap(short = 't', long = "type", default_value = "expense")]
    pub record_type: String,
    #[clap(short, long)]
    pub icon: Option<String>,
}

impl AddCategory {
    pub async fn run(self, session: &Session) -> Result<()> {
        let record_type: RecordType = self.record_type.parse().map_err(anyhow::Error::msg)?;
        let category = add_custom_category(
            &session.db,
            session.user()?,
            &self.name,
            record_type,
            self.icon.as_deref(),
        ).await?;
        println!("Category {} added with id {}.", category.name, category.id);
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteCategory {
    #[clap(short, long)]
    pub id: i64,
}

impl DeleteCategory {
    pub async fn run(self, session: &Session) -> Result<()> {
        let user_id = session.user()?;
        if !session.confirm(&format!("Delete category {}?", self.id))? {
            return Ok(());
        }
        delete_category(&session.db, user_id, self.id).await?;
        Ok(())
    }
}
