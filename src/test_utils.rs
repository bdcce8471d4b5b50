//! Shared test utilities.
//!
//! Common helpers for setting up in-memory test databases and inserting
//! fixture rows with sensible defaults.

use crate::{
    core::envelope,
    entities::{self, Bucket, Direction, transaction},
    errors::Result,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test envelope with a weekly income of 1000 and the default
/// 50/30/20 allocation: needs 200, wants 300, savings slice and pool 500.
pub async fn create_test_envelope(
    db: &DatabaseConnection,
    owner: &str,
) -> Result<entities::envelope::Model> {
    envelope::create_envelope(db, owner, 1000, None).await
}

/// Builds a `NaiveDate` from components, panicking on invalid input.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Inserts a raw transaction row without touching any envelope. Use this
/// for read-path tests that need a log with known contents.
pub async fn insert_transaction(
    db: &DatabaseConnection,
    owner: &str,
    direction: Direction,
    amount: i64,
    date: NaiveDate,
    bucket: Option<Bucket>,
) -> Result<entities::transaction::Model> {
    insert_transaction_at(db, owner, direction, amount, date, bucket, Utc::now()).await
}

/// Inserts a raw transaction row with an explicit creation timestamp, for
/// tests that depend on `(date, created_at)` ordering.
pub async fn insert_transaction_at(
    db: &DatabaseConnection,
    owner: &str,
    direction: Direction,
    amount: i64,
    date: NaiveDate,
    bucket: Option<Bucket>,
    created_at: DateTimeUtc,
) -> Result<entities::transaction::Model> {
    let model = transaction::ActiveModel {
        owner_id: Set(owner.to_string()),
        direction: Set(direction),
        amount: Set(amount),
        date: Set(date),
        bucket: Set(bucket),
        description: Set("Test transaction".to_string()),
        created_at: Set(created_at),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}
