use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Amount, Expense};

/// Aggregate of the expenses recorded in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    /// Month key in `YYYY-MM` form
    pub month: String,
    pub total: Amount,
    pub count: usize,
}

/// Sum of all amounts. Zero for an empty slice.
pub fn total_amount(expenses: &[Expense]) -> Amount {
    expenses.iter().map(|e| e.amount).sum()
}

/// Sum of amounts grouped by month key.
/// Only months that actually contain expenses are present.
pub fn totals_by_month(expenses: &[Expense]) -> BTreeMap<String, Amount> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(expense.month_key()).or_insert(0.0) += expense.amount;
    }
    totals
}

/// Per-month totals with expense counts, oldest month first.
pub fn monthly_summary(expenses: &[Expense]) -> Vec<MonthlyTotal> {
    let mut months: BTreeMap<String, MonthlyTotal> = BTreeMap::new();
    for expense in expenses {
        let month = expense.month_key();
        let entry = months.entry(month.clone()).or_insert(MonthlyTotal {
            month,
            total: 0.0,
            count: 0,
        });
        entry.total += expense.amount;
        entry.count += 1;
    }
    months.into_values().collect()
}
