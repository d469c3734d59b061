use chrono::{Local, TimeZone};

use tally_accounting::{
    aggregator::{DayRecords, MonthlySummary},
    budget::{BudgetOverview, CategoryBudgetItem},
};
use tally_data::{Category, CategoryStat, CategoryStatWithCount, DailyStat, Record};

/// Format an amount with two decimals and thousands
/// separators, like `1,234.56`.
pub fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (int, frac) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac)
}

fn format_time(timestamp: i64) -> String {
    match Local.timestamp_millis_opt(timestamp).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => timestamp.to_string(),
    }
}

fn bar(progress: f64) -> String {
    let filled = (progress / 5.0).round() as usize;
    format!("[{:<20}]", "#".repeat(filled.min(20)))
}

pub trait PrintFormatted {
    fn print_formatted(&self);
}

impl PrintFormatted for Record {
    fn print_formatted(&self) {
        println!("ID:\t\t{}", self.id);
        println!("Type:\t\t{}", self.record_type);
        println!("Amount:\t\t{}", format_amount(self.amount));
        println!("Category:\t{}", self.category);
        println!("Time:\t\t{}", format_time(self.timestamp));
        println!("Note:\t\t{}", self.note);
        if let Some(image) = &self.image_uri {
            println!("Image:\t\t{}", image);
        }
    }
}

impl PrintFormatted for Vec<DayRecords> {
    fn print_formatted(&self) {
        for day in self {
            println!(
                "{}\tincome {}\texpense {}",
                day.date,
                format_amount(day.income),
                format_amount(day.expense),
            );
            println!("{:-<72}", "-");
            for record in &day.records {
                let sign = match record.record_type {
                    tally_data::RecordType::Expense => "-",
                    tally_data::RecordType::Income => "+",
                };
                println!(
                    "{:>6}\t{:<16}\t{}{:>12}\t{}",
                    record.id,
                    record.category,
                    sign,
                    format_amount(record.amount),
                    record.note,
                );
            }
            println!();
        }
    }
}

impl PrintFormatted for Vec<Category> {
    fn print_formatted(&self) {
        println!("{:>4}\t{:<8}\t{:<20}\t{:<28}\t{}", "ID", "Type", "Name", "Icon", "Custom");
        println!("{:-<80}", "-");
        for category in self {
            let custom = if category.is_custom { "*" } else { "" };
            println!(
                "{:>4}\t{:<8}\t{:<20}\t{:<28}\t{}",
                category.id, category.record_type, category.name, category.icon, custom
            );
        }
    }
}

impl PrintFormatted for MonthlySummary {
    fn print_formatted(&self) {
        println!("Month:\t\t{}", self.month);
        println!("Income:\t\t{:>14}", format_amount(self.income));
        println!("Expense:\t{:>14}", format_amount(self.expense));
        println!("Balance:\t{:>14}", format_amount(self.balance));
    }
}

impl PrintFormatted for CategoryBudgetItem {
    fn print_formatted(&self) {
        let name = if self.budget.is_total() { "Total" } else { self.category() };
        let over = if self.is_over_budget { "over budget" } else { "" };
        println!(
            "{:<20}\t{:>12} / {:>12}\t{}\t{:>5.1}%\t{:>12} left\t{}",
            name,
            format_amount(self.used),
            format_amount(self.budget_amount()),
            bar(self.progress),
            self.progress,
            format_amount(self.remaining),
            over,
        );
    }
}

impl PrintFormatted for BudgetOverview {
    fn print_formatted(&self) {
        println!("Budgets for {}, spent {}", self.month, format_amount(self.expense));
        println!("{:-<110}", "-");
        match &self.total_item {
            Some(total) => total.print_formatted(),
            None => println!("No total budget set."),
        }
        for item in &self.category_items {
            item.print_formatted();
        }
    }
}

impl PrintFormatted for Vec<CategoryStat> {
    fn print_formatted(&self) {
        for stat in self {
            println!("{:<20}\t{:>14}", stat.category, format_amount(stat.total));
        }
    }
}

impl PrintFormatted for Vec<CategoryStatWithCount> {
    fn print_formatted(&self) {
        let total: f64 = self.iter().map(|s| s.total).sum();
        println!("{:>3}\t{:<20}\t{:>14}\t{:>6}\t{:>7}", "#", "Category", "Total", "Count", "Share");
        println!("{:-<72}", "-");
        for (rank, stat) in self.iter().enumerate() {
            let share = if total > 0.0 { stat.total * 100.0 / total } else { 0.0 };
            println!(
                "{:>3}\t{:<20}\t{:>14}\t{:>6}\t{:>6.1}%",
                rank + 1,
                stat.category,
                format_amount(stat.total),
                stat.count,
                share,
            );
        }
    }
}

impl PrintFormatted for Vec<DailyStat> {
    fn print_formatted(&self) {
        for stat in self {
            println!("{}\t{:>14}", stat.day, format_amount(stat.total));
        }
    }
}
