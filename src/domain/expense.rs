use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ExpenseError;

pub type ExpenseId = i64;

/// Amounts are plain decimal numbers; no currency is attached.
pub type Amount = f64;

/// A single recorded expenditure.
///
/// Construction validates the amount, the date and the title. The fields stay
/// public so the owning service can apply partial updates in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub amount: Amount,
    pub description: String,
    pub expense_date: NaiveDate,
}

impl Expense {
    /// Create a new expense, checking the date against the local calendar.
    pub fn new(
        id: ExpenseId,
        title: impl Into<String>,
        amount: Amount,
        description: impl Into<String>,
        expense_date: NaiveDate,
    ) -> Result<Self, ExpenseError> {
        Self::new_as_of(id, title, amount, description, expense_date, today())
    }

    /// Same as [`Expense::new`], with an explicit notion of "today".
    /// Checks run in a fixed order: amount, date, title.
    pub fn new_as_of(
        id: ExpenseId,
        title: impl Into<String>,
        amount: Amount,
        description: impl Into<String>,
        expense_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Self, ExpenseError> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(ExpenseError::InvalidAmount(amount));
        }

        if expense_date > today {
            return Err(ExpenseError::InvalidExpenseDate {
                date: expense_date,
                today,
            });
        }

        let title = title.into();
        if title.trim().is_empty() {
            return Err(ExpenseError::EmptyTitle);
        }

        Ok(Self {
            id,
            title,
            amount,
            description: description.into(),
            expense_date,
        })
    }

    /// Zero-padded `YYYY-MM` key used for monthly aggregation.
    pub fn month_key(&self) -> String {
        self.expense_date.format("%Y-%m").to_string()
    }
}

/// The current date on the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
