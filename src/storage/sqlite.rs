use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::{Expense, ExpenseId};

use super::{ExpenseRepository, MIGRATION_001_INITIAL};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository persisting expenses in a SQLite database.
///
/// SQLite stores a NaN `REAL` as NULL, which the `amount NOT NULL` column
/// rejects. Saving an expense whose amount is NaN (reachable through an
/// unvalidated update) therefore fails with a storage error and leaves the
/// stored row unchanged; the in-memory backend accepts it.
pub struct SqliteExpenseRepository {
    pool: SqlitePool,
}

impl SqliteExpenseRepository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Delete every stored expense. The id counter is left alone.
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM expenses")
            .execute(&self.pool)
            .await
            .context("Failed to clear expenses")?;
        Ok(())
    }

    fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Result<Expense> {
        let date_str: String = row.get("expense_date");

        // Stored rows are trusted; validation happened when they were created
        Ok(Expense {
            id: row.get("id"),
            title: row.get("title"),
            amount: row.get("amount"),
            description: row.get("description"),
            expense_date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Invalid expense date: {}", date_str))?,
        })
    }
}

impl ExpenseRepository for SqliteExpenseRepository {
    async fn save(&mut self, expense: &Expense) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start transaction")?;

        sqlx::query(
            r#"
            INSERT INTO expenses (id, title, amount, description, expense_date)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                amount = excluded.amount,
                description = excluded.description,
                expense_date = excluded.expense_date
            "#,
        )
        .bind(expense.id)
        .bind(&expense.title)
        .bind(expense.amount)
        .bind(&expense.description)
        .bind(expense.expense_date.format(DATE_FORMAT).to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to save expense")?;

        sqlx::query("UPDATE id_counter SET value = MAX(value, ?) WHERE name = 'expense_id'")
            .bind(expense.id)
            .execute(&mut *tx)
            .await
            .context("Failed to update id counter")?;

        tx.commit().await.context("Failed to commit expense")?;
        debug!(id = expense.id, "saved expense to sqlite");
        Ok(())
    }

    async fn remove(&mut self, id: ExpenseId) -> Result<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to remove expense")?;
        debug!(id, rows = result.rows_affected(), "removed expense from sqlite");
        Ok(())
    }

    async fn get_by_id(&self, id: ExpenseId) -> Result<Option<Expense>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, amount, description, expense_date
            FROM expenses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch expense")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_expense(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Expense>> {
        let rows = sqlx::query(
            "SELECT id, title, amount, description, expense_date FROM expenses ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list expenses")?;

        rows.iter().map(Self::row_to_expense).collect()
    }

    async fn high_water_mark(&self) -> Result<Option<ExpenseId>> {
        let value: i64 = sqlx::query("SELECT value FROM id_counter WHERE name = 'expense_id'")
            .fetch_one(&self.pool)
            .await
            .context("Failed to read id counter")?
            .get("value");

        Ok((value > 0).then_some(value))
    }
}
