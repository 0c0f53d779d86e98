use thiserror::Error;

use crate::domain::{ExpenseError, ExpenseId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ExpenseError),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
