use anyhow::Result;

use crate::domain::{Expense, ExpenseId};

/// Storage contract the expense service depends on.
///
/// Backends decide their own iteration order and failure modes. Errors are
/// treated as fatal by callers; a missing id is never an error.
#[allow(async_fn_in_trait)]
pub trait ExpenseRepository {
    /// Insert the expense, or replace the stored one with the same id.
    async fn save(&mut self, expense: &Expense) -> Result<()>;

    /// Delete the expense with this id. Does nothing if it is not stored.
    async fn remove(&mut self, id: ExpenseId) -> Result<()>;

    /// Look up a single expense.
    async fn get_by_id(&self, id: ExpenseId) -> Result<Option<Expense>>;

    /// Snapshot of every stored expense. Changing the returned vector never
    /// affects the store.
    async fn list_all(&self) -> Result<Vec<Expense>>;

    /// Largest id this store has ever accepted, including removed ones.
    async fn high_water_mark(&self) -> Result<Option<ExpenseId>>;
}
