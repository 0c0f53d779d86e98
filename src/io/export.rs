use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::ExpenseService;
use crate::domain::{Amount, Expense, total_amount};
use crate::storage::ExpenseRepository;

/// Full dump of the expense store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub expenses: Vec<Expense>,
    pub total: Amount,
}

/// Exporter for converting expenses to various formats
pub struct Exporter<'a, R> {
    service: &'a ExpenseService<R>,
}

impl<'a, R: ExpenseRepository> Exporter<'a, R> {
    pub fn new(service: &'a ExpenseService<R>) -> Self {
        Self { service }
    }

    /// Export expenses to CSV format
    pub async fn export_expenses_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "date", "title", "amount", "description"])?;

        for expense in &expenses {
            csv_writer.write_record([
                expense.id.to_string(),
                expense.expense_date.format("%Y-%m-%d").to_string(),
                expense.title.clone(),
                expense.amount.to_string(),
                expense.description.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(expenses.len())
    }

    /// Export every expense as a JSON snapshot
    pub async fn export_json<W: Write>(&self, mut writer: W) -> Result<ExpenseSnapshot> {
        let expenses = self.service.list_expenses().await?;

        let snapshot = ExpenseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            total: total_amount(&expenses),
            expenses,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
