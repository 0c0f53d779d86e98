use chrono::NaiveDate;
use thiserror::Error;

use super::Amount;

/// Reasons an expense cannot be constructed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpenseError {
    #[error("Invalid amount: {0} (must be greater than zero)")]
    InvalidAmount(Amount),

    #[error("Invalid expense date: {date} is later than today ({today})")]
    InvalidExpenseDate { date: NaiveDate, today: NaiveDate },

    #[error("Expense title cannot be empty")]
    EmptyTitle,
}
