use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::application::{ExpenseService, ExpenseUpdate, NewExpense};
use crate::domain::{Amount, Expense, ExpenseId};
use crate::storage::SqliteExpenseRepository;

type Service = ExpenseService<SqliteExpenseRepository>;

/// Spesa - Personal Expense Tracker
#[derive(Parser)]
#[command(name = "spesa")]
#[command(about = "A local-first tracker for personal expenses")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "SPESA_DATABASE", default_value = "spesa.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Record a new expense
    Add {
        /// Short title (e.g., "Groceries")
        title: String,

        /// Amount spent (e.g., "12.50")
        #[arg(allow_negative_numbers = true)]
        amount: Amount,

        /// Free-form description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List all expenses
    List,

    /// Show a single expense
    Show {
        /// Expense ID
        id: ExpenseId,
    },

    /// Change the title, amount or description of an expense
    Update {
        /// Expense ID
        id: ExpenseId,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New amount
        #[arg(long, allow_negative_numbers = true)]
        amount: Option<Amount>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove an expense
    Remove {
        /// Expense ID
        id: ExpenseId,
    },

    /// Show the total of all expenses
    Total,

    /// Show totals grouped by month
    Monthly {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export all expenses to CSV or JSON
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

impl Cli {
    /// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
    fn init_logging(&self) {
        let default_level = if self.verbose { "spesa=debug" } else { "spesa=warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    pub async fn run(self) -> Result<()> {
        self.init_logging();

        match self.command {
            Commands::Init => {
                Service::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Add {
                title,
                amount,
                description,
                date,
            } => {
                let mut service = Service::connect(&self.database).await?;

                let mut new = NewExpense::new(title, amount).with_description(description);
                if let Some(date_str) = date {
                    new = new.on(parse_date(&date_str)?);
                }

                let expense = service.create_expense(new).await?;
                println!(
                    "Recorded expense #{}: {} {:.2} ({})",
                    expense.id, expense.title, expense.amount, expense.expense_date
                );
            }

            Commands::List => {
                let service = Service::connect(&self.database).await?;
                run_list_command(&service).await?;
            }

            Commands::Show { id } => {
                let service = Service::connect(&self.database).await?;
                let expense = service.get_expense_or_err(id).await?;
                print_expense(&expense);
            }

            Commands::Update {
                id,
                title,
                amount,
                description,
            } => {
                let mut service = Service::connect(&self.database).await?;
                let update = ExpenseUpdate {
                    title,
                    amount,
                    description,
                };
                if update.is_empty() {
                    anyhow::bail!("Nothing to update. Pass --title, --amount or --description");
                }

                match service.update_expense(id, update).await? {
                    Some(expense) => {
                        println!("Updated expense #{}", expense.id);
                        print_expense(&expense);
                    }
                    None => println!("No expense with id {}", id),
                }
            }

            Commands::Remove { id } => {
                let mut service = Service::connect(&self.database).await?;
                if service.remove_expense(id).await? {
                    println!("Removed expense #{}", id);
                } else {
                    println!("No expense with id {}", id);
                }
            }

            Commands::Total => {
                let service = Service::connect(&self.database).await?;
                let total = service.total_amount().await?;
                println!("Total: {:.2}", total);
            }

            Commands::Monthly { format } => {
                let service = Service::connect(&self.database).await?;
                run_monthly_command(&service, &format).await?;
            }

            Commands::Export { output, format } => {
                let service = Service::connect(&self.database).await?;
                run_export_command(&service, output.as_deref(), &format).await?;
            }
        }

        Ok(())
    }
}

async fn run_list_command(service: &Service) -> Result<()> {
    let expenses = service.list_expenses().await?;

    if expenses.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<10}  {:<24}  {:>12}  DESCRIPTION",
        "ID", "DATE", "TITLE", "AMOUNT"
    );
    println!("{}", "-".repeat(72));
    for expense in &expenses {
        println!(
            "{:>5}  {:<10}  {:<24}  {:>12.2}  {}",
            expense.id,
            expense.expense_date,
            truncate(&expense.title, 24),
            expense.amount,
            expense.description
        );
    }

    Ok(())
}

async fn run_monthly_command(service: &Service, format: &str) -> Result<()> {
    let summary = service.monthly_summary().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        "csv" => {
            println!("month,total,count");
            for month in &summary {
                println!("{},{},{}", month.month, month.total, month.count);
            }
        }
        "table" => {
            if summary.is_empty() {
                println!("No expenses found.");
                return Ok(());
            }
            println!("{:<8} {:>12} {:>6}", "MONTH", "TOTAL", "COUNT");
            println!("{}", "-".repeat(28));
            for month in &summary {
                println!("{:<8} {:>12.2} {:>6}", month.month, month.total, month.count);
            }
        }
        other => anyhow::bail!("Unknown format '{}'. Valid formats: table, json, csv", other),
    }

    Ok(())
}

async fn run_export_command(service: &Service, output: Option<&str>, format: &str) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match format {
        "csv" => {
            let count = exporter.export_expenses_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "json" => {
            let snapshot = exporter.export_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported {} expenses (total {:.2})",
                    snapshot.expenses.len(),
                    snapshot.total
                );
            }
        }
        other => anyhow::bail!("Unknown export format '{}'. Valid formats: csv, json", other),
    }

    Ok(())
}

fn print_expense(expense: &Expense) {
    println!("Expense #{}", expense.id);
    println!("  Title:        {}", expense.title);
    println!("  Amount:       {:.2}", expense.amount);
    println!("  Date:         {}", expense.expense_date);
    if !expense.description.is_empty() {
        println!("  Description:  {}", expense.description);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('…');
        out
    }
}

/// Parse a YYYY-MM-DD date.
fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}
