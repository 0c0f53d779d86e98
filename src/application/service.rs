use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{
    self, Amount, Expense, ExpenseId, MonthlyTotal, monthly_summary, totals_by_month,
};
use crate::storage::{ExpenseRepository, SqliteExpenseRepository};

use super::AppError;

/// Input for recording a new expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub title: String,
    pub amount: Amount,
    pub description: String,
    /// Defaults to today when omitted
    pub expense_date: Option<NaiveDate>,
}

impl NewExpense {
    pub fn new(title: impl Into<String>, amount: Amount) -> Self {
        Self {
            title: title.into(),
            amount,
            description: String::new(),
            expense_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.expense_date = Some(date);
        self
    }
}

/// Partial update of an existing expense. `None` fields are left as they are.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub amount: Option<Amount>,
    pub description: Option<String>,
}

impl ExpenseUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.amount.is_none() && self.description.is_none()
    }

    /// Overwrite the provided fields. Entity validation is not re-run here.
    fn apply(self, expense: &mut Expense) {
        if let Some(title) = self.title {
            expense.title = title;
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(description) = self.description {
            expense.description = description;
        }
    }
}

/// Application service for recording and summarizing expenses.
/// This is the primary interface for any client (CLI, tests, other front ends).
///
/// Ids are issued from a counter owned by the service: they start at 1, grow
/// by one per successful creation and are never handed out twice.
pub struct ExpenseService<R> {
    repo: R,
    next_id: ExpenseId,
}

impl<R: ExpenseRepository> ExpenseService<R> {
    /// Create a service that issues ids starting from 1.
    pub fn new(repo: R) -> Self {
        Self { repo, next_id: 1 }
    }

    /// Create a service that continues after the highest id the repository
    /// has ever stored.
    pub async fn resume(repo: R) -> Result<Self, AppError> {
        let next_id = repo.high_water_mark().await?.map_or(1, |last| last + 1);
        debug!(next_id, "resuming expense service");
        Ok(Self { repo, next_id })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn into_repository(self) -> R {
        self.repo
    }

    /// The id the next successful creation will receive.
    pub fn next_id(&self) -> ExpenseId {
        self.next_id
    }

    /// Record a new expense.
    /// A validation failure leaves both the repository and the id counter untouched.
    pub async fn create_expense(&mut self, new: NewExpense) -> Result<Expense, AppError> {
        let expense_date = new.expense_date.unwrap_or_else(domain::today);
        let expense = Expense::new(
            self.next_id,
            new.title,
            new.amount,
            new.description,
            expense_date,
        )?;

        self.repo.save(&expense).await?;
        self.next_id += 1;

        info!(id = expense.id, amount = expense.amount, "created expense");
        Ok(expense)
    }

    /// Remove an expense. Unknown ids are ignored.
    /// Returns whether an expense was actually stored under `id`.
    pub async fn remove_expense(&mut self, id: ExpenseId) -> Result<bool, AppError> {
        if self.repo.get_by_id(id).await?.is_none() {
            debug!(id, "remove skipped, expense not found");
            return Ok(false);
        }

        self.repo.remove(id).await?;
        info!(id, "removed expense");
        Ok(true)
    }

    /// Apply a partial update. Returns the stored result, or `None` when no
    /// expense has this id (nothing is written in that case).
    pub async fn update_expense(
        &mut self,
        id: ExpenseId,
        update: ExpenseUpdate,
    ) -> Result<Option<Expense>, AppError> {
        let Some(mut expense) = self.repo.get_by_id(id).await? else {
            debug!(id, "update skipped, expense not found");
            return Ok(None);
        };

        update.apply(&mut expense);
        self.repo.save(&expense).await?;

        info!(id, "updated expense");
        Ok(Some(expense))
    }

    /// Look up a single expense.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Option<Expense>, AppError> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Look up a single expense, treating a missing id as an error.
    pub async fn get_expense_or_err(&self, id: ExpenseId) -> Result<Expense, AppError> {
        self.get_expense(id)
            .await?
            .ok_or(AppError::ExpenseNotFound(id))
    }

    /// All stored expenses, in repository order.
    pub async fn list_expenses(&self) -> Result<Vec<Expense>, AppError> {
        Ok(self.repo.list_all().await?)
    }

    /// Sum of every stored amount.
    pub async fn total_amount(&self) -> Result<Amount, AppError> {
        let expenses = self.list_expenses().await?;
        Ok(domain::total_amount(&expenses))
    }

    /// Totals keyed by `YYYY-MM`. Months without expenses are absent.
    pub async fn total_by_month(&self) -> Result<BTreeMap<String, Amount>, AppError> {
        let expenses = self.list_expenses().await?;
        Ok(totals_by_month(&expenses))
    }

    /// Per-month totals and counts, oldest month first.
    pub async fn monthly_summary(&self) -> Result<Vec<MonthlyTotal>, AppError> {
        let expenses = self.list_expenses().await?;
        Ok(monthly_summary(&expenses))
    }
}

impl ExpenseService<SqliteExpenseRepository> {
    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = SqliteExpenseRepository::init(&db_url).await?;
        Self::resume(repo).await
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = SqliteExpenseRepository::connect(&db_url).await?;
        Self::resume(repo).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use crate::domain::{ExpenseError, today};
    use crate::storage::InMemoryExpenseRepository;

    use super::*;

    fn service() -> ExpenseService<InMemoryExpenseRepository> {
        ExpenseService::new(InMemoryExpenseRepository::new())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_not_reused() -> Result<(), AppError> {
        let mut service = service();

        let a = service.create_expense(NewExpense::new("A", 1.0)).await?;
        let b = service.create_expense(NewExpense::new("B", 2.0)).await?;
        service.remove_expense(b.id).await?;
        let c = service.create_expense(NewExpense::new("C", 3.0)).await?;

        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_reports_whether_anything_was_removed() -> Result<(), AppError> {
        let mut service = service();
        let a = service.create_expense(NewExpense::new("A", 1.0)).await?;
        service.create_expense(NewExpense::new("B", 2.0)).await?;

        assert!(!service.remove_expense(42).await?);
        assert_eq!(service.list_expenses().await?.len(), 2);

        assert!(service.remove_expense(a.id).await?);
        assert!(!service.remove_expense(a.id).await?);
        let remaining = service.list_expenses().await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "B");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_date_defaults_to_today() -> Result<(), AppError> {
        let mut service = service();

        let expense = service.create_expense(NewExpense::new("Pan", 2.0)).await?;

        assert_eq!(expense.expense_date, today());
        assert_eq!(expense.description, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_create_has_no_side_effects() -> Result<(), AppError> {
        let mut service = service();
        let tomorrow = today().checked_add_days(Days::new(1)).unwrap();

        let err = service
            .create_expense(NewExpense::new("Futuro", 5.0).on(tomorrow))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Validation(ExpenseError::InvalidExpenseDate { .. })
        ));

        let err = service
            .create_expense(NewExpense::new("   ", 5.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ExpenseError::EmptyTitle)));

        assert_eq!(service.next_id(), 1);
        assert!(service.repository().is_empty());

        let expense = service.create_expense(NewExpense::new("Ok", 5.0)).await?;
        assert_eq!(expense.id, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_only_touches_given_fields() -> Result<(), AppError> {
        let mut service = service();
        let created = service
            .create_expense(NewExpense::new("Camiseta", 15.0).with_description("Ropa"))
            .await?;

        let updated = service
            .update_expense(created.id, ExpenseUpdate::new().with_amount(18.0))
            .await?
            .expect("expense should exist");

        assert_eq!(updated.title, "Camiseta");
        assert_eq!(updated.amount, 18.0);
        assert_eq!(updated.description, "Ropa");
        assert_eq!(service.list_expenses().await?, vec![updated]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_missing_id_is_noop() -> Result<(), AppError> {
        let mut service = service();
        service.create_expense(NewExpense::new("A", 1.0)).await?;
        let before = service.list_expenses().await?;

        let result = service
            .update_expense(999, ExpenseUpdate::new().with_title("Nada"))
            .await?;

        assert!(result.is_none());
        assert_eq!(service.list_expenses().await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_does_not_revalidate() -> Result<(), AppError> {
        let mut service = service();
        let created = service.create_expense(NewExpense::new("A", 1.0)).await?;

        let updated = service
            .update_expense(created.id, ExpenseUpdate::new().with_amount(-4.0).with_title(""))
            .await?
            .expect("expense should exist");

        assert_eq!(updated.amount, -4.0);
        assert_eq!(updated.title, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_totals() -> Result<(), AppError> {
        let mut service = service();
        assert_eq!(service.total_amount().await?, 0.0);
        assert!(service.total_by_month().await?.is_empty());

        service
            .create_expense(NewExpense::new("Enero 1", 10.0).on(date(2025, 1, 10)))
            .await?;
        service
            .create_expense(NewExpense::new("Enero 2", 5.0).on(date(2025, 1, 20)))
            .await?;
        let feb = service
            .create_expense(NewExpense::new("Febrero", 7.0).on(date(2025, 2, 1)))
            .await?;

        assert_eq!(service.total_amount().await?, 22.0);
        let totals = service.total_by_month().await?;
        assert_eq!(totals.len(), 2);
        assert_eq!(totals["2025-01"], 15.0);
        assert_eq!(totals["2025-02"], 7.0);

        service.remove_expense(feb.id).await?;
        assert_eq!(service.total_amount().await?, 15.0);
        assert!(!service.total_by_month().await?.contains_key("2025-02"));
        Ok(())
    }

    #[tokio::test]
    async fn test_resume_continues_after_high_water_mark() -> Result<(), AppError> {
        let mut service = service();
        service.create_expense(NewExpense::new("A", 1.0)).await?;
        let b = service.create_expense(NewExpense::new("B", 1.0)).await?;
        service.remove_expense(b.id).await?;

        let mut resumed = ExpenseService::resume(service.into_repository()).await?;
        let c = resumed.create_expense(NewExpense::new("C", 1.0)).await?;

        assert_eq!(c.id, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_expense_or_err() -> Result<(), AppError> {
        let mut service = service();
        let created = service.create_expense(NewExpense::new("A", 1.0)).await?;

        assert_eq!(service.get_expense_or_err(created.id).await?, created);
        assert!(matches!(
            service.get_expense_or_err(42).await,
            Err(AppError::ExpenseNotFound(42))
        ));
        Ok(())
    }
}
