use anyhow::Result;
use tracing::debug;

use crate::domain::{Expense, ExpenseId};

use super::ExpenseRepository;

/// Repository keeping expenses in a vector, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExpenseRepository {
    expenses: Vec<Expense>,
    high_water_mark: Option<ExpenseId>,
}

impl InMemoryExpenseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

impl ExpenseRepository for InMemoryExpenseRepository {
    async fn save(&mut self, expense: &Expense) -> Result<()> {
        match self.expenses.iter_mut().find(|e| e.id == expense.id) {
            Some(existing) => {
                debug!(id = expense.id, "replacing expense in memory");
                *existing = expense.clone();
            }
            None => {
                debug!(id = expense.id, "appending expense in memory");
                self.expenses.push(expense.clone());
            }
        }
        self.high_water_mark = self.high_water_mark.max(Some(expense.id));
        Ok(())
    }

    async fn remove(&mut self, id: ExpenseId) -> Result<()> {
        if let Some(index) = self.expenses.iter().position(|e| e.id == id) {
            self.expenses.remove(index);
        }
        Ok(())
    }

    async fn get_by_id(&self, id: ExpenseId) -> Result<Option<Expense>> {
        Ok(self.expenses.iter().find(|e| e.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Expense>> {
        Ok(self.expenses.clone())
    }

    async fn high_water_mark(&self) -> Result<Option<ExpenseId>> {
        Ok(self.high_water_mark)
    }
}
