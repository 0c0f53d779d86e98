// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use spesa::application::ExpenseService;
use spesa::storage::SqliteExpenseRepository;
use tempfile::TempDir;

pub type SqliteService = ExpenseService<SqliteExpenseRepository>;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(SqliteService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = SqliteService::init(&db_path(&temp_dir)).await?;
    Ok((service, temp_dir))
}

/// Path of the database file inside a test directory
pub fn db_path(temp_dir: &TempDir) -> String {
    temp_dir.path().join("test.db").to_str().unwrap().to_string()
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}
