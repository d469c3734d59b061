use anyhow::Result;
use clap::{Args, Subcommand};

use tally_accounting::budget::BudgetTracker;

use crate::commands::month_arg;
use crate::formatting::PrintFormatted;
use crate::session::Session;

#[derive(Subcommand, Debug)]
pub enum Budgets {
    /// Show the budgets of a month against spending
    #[clap(name = "show")]
    Show(ShowBudgets),
    /// Set the month total or a category budget
    #[clap(name = "set")]
    Set(SetBudget),
    /// Remove the month total or a category budget
    #[clap(name = "delete")]
    Delete(DeleteBudget),
}

impl Budgets {
    pub async fn run(self, session: &Session) -> Result<()> {
        match self {
            Budgets::Show(cmd) => cmd.run(session).await,
            Budgets::Set(cmd) => cmd.run(session).await,
            Budgets::Delete(cmd) => cmd.run(session).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShowBudgets {
    /// YYYY-MM, defaults to the current month
    #[clap(short, long)]
    pub month: Option<String>,
}

impl ShowBudgets {
    pub async fn run(self, session: &Session) -> Result<()> {
        let month = month_arg(&self.month);
        let user_id = session.user()?;
        let tracker = BudgetTracker::new(session.db.clone());

        let overview = tracker.overview(user_id, &month).await?;
        overview.print_formatted();

        let available = tracker.available_categories(user_id, &month).await?;
        if !available.is_empty() {
            println!();
            println!("Without budget: {}", available.join(", "));
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct SetBudget {
    #[clap(short, long)]
    pub amount: f64,
    /// Leave out to set the month total
    #[clap(short, long)]
    pub category: Option<String>,
    #[clap(short, long)]
    pub month: Option<String>,
}

impl SetBudget {
    pub async fn run(self, session: &Session) -> Result<()> {
        let month = month_arg(&self.month);
        let user_id = session.user()?;
        let tracker = BudgetTracker::new(session.db.clone());

        let budget = match &self.category {
            Some(category) => {
                tracker
                    .set_category_budget(user_id, &month, category, self.amount)
                    .await?
            }
            None => tracker.set_total_budget(user_id, &month, self.amount).await?,
        };
        println!(
            "Budget for {} in {} set to {:.2}.",
            budget.category.as_deref().unwrap_or("all expenses"),
            budget.month,
            budget.amount,
        );
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteBudget {
    /// Leave out to remove the month total
    #[clap(short, long)]
    pub category: Option<String>,
    #[clap(short, long)]
    pub month: Option<String>,
}

impl DeleteBudget {
    pub async fn run(self, session: &Session) -> Result<()> {
        let month = month_arg(&self.month);
        let user_id = session.user()?;
        let tracker = BudgetTracker::new(session.db.clone());

        let name = self.category.as_deref().unwrap_or("all expenses");
        if !session.confirm(&format!("Delete budget for {} in {}?", name, month))? {
            return Ok(());
        }
        match &self.category {
            Some(category) => {
                tracker
                    .delete_category_budget(user_id, &month, category)
                    .await?
            }
            None => tracker.delete_total_budget(user_id, &month).await?,
        }
        Ok(())
    }
}
