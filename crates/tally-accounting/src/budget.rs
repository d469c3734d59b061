use anyhow::Result;
use chrono::{Local, TimeZone};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tally_data::{
    validate_amount, validate_category_name, Budget, BudgetFilter, BudgetScope,
    Category, CategoryFilter, Delete, Insert, Query, Record, RecordFilter,
    RecordType, Subscribe, Update,
};

use crate::aggregator::Aggregator;
use crate::datetime::Month;

/// A budget together with how much of it is used.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBudgetItem {
    pub budget: Budget,
    pub used: f64,
    /// Never negative
    pub remaining: f64,
    /// Percentage, clamped to 0..=100
    pub progress: f64,
    pub is_over_budget: bool,
}

impl CategoryBudgetItem {
    /// Derive the progress of a budget from the used amount.
    pub fn new(budget: Budget, used: f64) -> Self {
        let amount = budget.amount;
        let progress = if amount > 0.0 {
            (used * 100.0 / amount).clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            remaining: (amount - used).max(0.0),
            is_over_budget: used > amount,
            progress,
            used,
            budget,
        }
    }

    /// The budgeted category, empty for the month total.
    pub fn category(&self) -> &str {
        self.budget.category.as_deref().unwrap_or("")
    }

    pub fn budget_amount(&self) -> f64 {
        self.budget.amount
    }
}

/// Budgets of a month measured against the month's expense.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetOverview {
    pub month: Month,
    /// The month total, if one is set
    pub total_budget: Option<f64>,
    /// Expense of the whole month
    pub expense: f64,
    pub total_item: Option<CategoryBudgetItem>,
    pub category_items: Vec<CategoryBudgetItem>,
}

/// Keeps monthly budgets and compares them against spending.
#[derive(Debug, Clone)]
pub struct BudgetTracker<DB, Tz: TimeZone = Local> {
    db: DB,
    aggregator: Aggregator<DB, Tz>,
}

impl<DB> BudgetTracker<DB, Local>
where
    DB: Clone,
{
    pub fn new(db: DB) -> Self {
        Self {
            aggregator: Aggregator::new(db.clone()),
            db,
        }
    }
}

impl<DB, Tz> BudgetTracker<DB, Tz>
where
    DB: Query<Budget, Filter = BudgetFilter>
        + Insert<Budget>
        + Update<Budget>
        + Delete<Budget>
        + Query<Record, Filter = RecordFilter>
        + Query<Category, Filter = CategoryFilter>
        + Clone
        + Send
        + Sync,
    Tz: TimeZone + Send + Sync,
{
    pub fn with_timezone(db: DB, tz: Tz) -> Self {
        Self {
            aggregator: Aggregator::with_timezone(db.clone(), tz),
            db,
        }
    }

    pub fn aggregator(&self) -> &Aggregator<DB, Tz> {
        &self.aggregator
    }

    async fn find(
        &self,
        user_id: &str,
        month: &Month,
        scope: BudgetScope,
    ) -> Result<Vec<Budget>> {
        let filter = BudgetFilter {
            user_id: Some(user_id.to_string()),
            month: Some(month.to_string()),
            scope,
            ..Default::default()
        };
        Query::<Budget>::query(&self.db, &filter).await
    }

    /// Insert a budget, or change the amount of the
    /// existing one for the same month and category.
    async fn upsert(
        &self,
        user_id: &str,
        month: &Month,
        category: Option<String>,
        amount: f64,
    ) -> Result<Budget> {
        let scope = match &category {
            Some(name) => BudgetScope::Category(name.clone()),
            None => BudgetScope::Total,
        };
        let existing = self.find(user_id, month, scope).await?;
        let budget = match existing.into_iter().next() {
            Some(budget) => {
                debug!(id = budget.id, amount, "updating budget");
                Update::update(&self.db, Budget { amount, ..budget }).await?
            }
            None => {
                let budget = Budget {
                    id: 0,
                    user_id: user_id.to_string(),
                    category,
                    amount,
                    month: month.to_string(),
                };
                Insert::insert(&self.db, budget).await?
            }
        };
        info!(
            user_id,
            month = %budget.month,
            category = budget.category.as_deref().unwrap_or("*"),
            amount = budget.amount,
            "budget set"
        );
        Ok(budget)
    }

    /// Set the budget for the whole month.
    pub async fn set_total_budget(
        &self,
        user_id: &str,
        month: &Month,
        amount: f64,
    ) -> Result<Budget> {
        let amount = validate_amount(amount)?;
        self.upsert(user_id, month, None, amount).await
    }

    /// Set the budget of one category for the month.
    pub async fn set_category_budget(
        &self,
        user_id: &str,
        month: &Month,
        category: &str,
        amount: f64,
    ) -> Result<Budget> {
        let category = validate_category_name(category)?;
        let amount = validate_amount(amount)?;
        self.upsert(user_id, month, Some(category), amount).await
    }

    async fn delete_scope(
        &self,
        user_id: &str,
        month: &Month,
        scope: BudgetScope,
    ) -> Result<()> {
        for budget in self.find(user_id, month, scope).await? {
            Delete::delete(&self.db, budget).await?;
        }
        Ok(())
    }

    /// Remove the month total. Nothing to remove is fine.
    pub async fn delete_total_budget(&self, user_id: &str, month: &Month) -> Result<()> {
        self.delete_scope(user_id, month, BudgetScope::Total).await
    }

    /// Remove a category budget. Nothing to remove is fine.
    pub async fn delete_category_budget(
        &self,
        user_id: &str,
        month: &Month,
        category: &str,
    ) -> Result<()> {
        let scope = BudgetScope::Category(category.trim().to_string());
        self.delete_scope(user_id, month, scope).await
    }

    pub async fn total_budget(&self, user_id: &str, month: &Month) -> Result<Option<Budget>> {
        let budgets = self.find(user_id, month, BudgetScope::Total).await?;
        Ok(budgets.into_iter().next())
    }

    pub async fn category_budgets(&self, user_id: &str, month: &Month) -> Result<Vec<Budget>> {
        self.find(user_id, month, BudgetScope::Categories).await
    }

    /// Every category budget of the month with its used amount.
    pub async fn category_budget_items(
        &self,
        user_id: &str,
        month: &Month,
    ) -> Result<Vec<CategoryBudgetItem>> {
        let mut items = vec![];
        for budget in self.category_budgets(user_id, month).await? {
            let category = budget.category.clone().unwrap_or_default();
            let used = self
                .aggregator
                .category_expense(user_id, month, &category)
                .await?;
            items.push(CategoryBudgetItem::new(budget, used));
        }
        Ok(items)
    }

    /// Snapshot of all budgets of the month.
    pub async fn overview(&self, user_id: &str, month: &Month) -> Result<BudgetOverview> {
        let expense = self
            .aggregator
            .monthly_total(user_id, month, RecordType::Expense)
            .await?;
        let total_item = self
            .total_budget(user_id, month)
            .await?
            .map(|budget| CategoryBudgetItem::new(budget, expense));
        let category_items = self.category_budget_items(user_id, month).await?;
        Ok(BudgetOverview {
            month: *month,
            total_budget: total_item.as_ref().map(|item| item.budget_amount()),
            expense,
            total_item,
            category_items,
        })
    }

    /// Expense categories of the user without a budget
    /// in the month.
    pub async fn available_categories(
        &self,
        user_id: &str,
        month: &Month,
    ) -> Result<Vec<String>> {
        let filter = CategoryFilter {
            user_id: Some(user_id.to_string()),
            record_type: Some(RecordType::Expense),
            ..Default::default()
        };
        let categories: Vec<Category> = Query::<Category>::query(&self.db, &filter).await?;
        let budgets = self.category_budgets(user_id, month).await?;
        let available = categories
            .into_iter()
            .map(|c| c.name)
            .filter(|name| !budgets.iter().any(|b| b.category.as_ref() == Some(name)))
            .collect();
        Ok(available)
    }
}

impl<DB, Tz> BudgetTracker<DB, Tz>
where
    DB: Query<Budget, Filter = BudgetFilter>
        + Insert<Budget>
        + Update<Budget>
        + Delete<Budget>
        + Query<Record, Filter = RecordFilter>
        + Query<Category, Filter = CategoryFilter>
        + Subscribe
        + Clone
        + Send
        + Sync
        + 'static,
    Tz: TimeZone + Send + Sync + 'static,
{
    /// Invoke the callback with a fresh overview now and
    /// after every change to the user's records or budgets.
    /// The watch ends when the returned task is aborted.
    pub fn watch_overview<F>(
        &self,
        user_id: &str,
        month: Month,
        mut callback: F,
    ) -> JoinHandle<()>
    where
        F: FnMut(Result<BudgetOverview>) + Send + 'static,
    {
        // Subscribe before the first snapshot so no write is missed
        let mut changes = self.db.subscribe();
        let tracker = self.clone();
        let user_id = user_id.to_string();

        tokio::spawn(async move {
            callback(tracker.overview(&user_id, &month).await);
            loop {
                match changes.recv().await {
                    Ok(change) if change.touches_budgets_of(&user_id) => {}
                    Ok(_) => continue,
                    Err(RecvError::Lagged(n)) => {
                        warn!(skipped = n, "budget watch lagged, refreshing");
                    }
                    Err(RecvError::Closed) => break,
                }
                callback(tracker.overview(&user_id, &month).await);
            }
        })
    }
}
