//! Transaction log business logic.
//!
//! The log is append-only: rows are written once by [`record_transaction`]
//! and afterward only the non-identity fields (description, date) may be
//! edited. Recording a bucketed transaction applies the matching envelope
//! effect (expense spends, income tops up) inside the same store
//! transaction, so the log and the envelope can never drift apart: if the
//! spend is rejected, no row is written.

use crate::{
    core::envelope,
    entities::{Bucket, Direction, Transaction, transaction},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, QueryOrder, Set, TransactionTrait, prelude::*};

/// Optional edits to a transaction's non-identity fields.
#[derive(Debug, Clone, Default)]
pub struct TransactionChanges {
    /// New description, if changed
    pub description: Option<String>,
    /// New calendar date, if changed
    pub date: Option<NaiveDate>,
}

impl TransactionChanges {
    fn is_empty(&self) -> bool {
        self.description.is_none() && self.date.is_none()
    }
}

/// Appends a transaction to the log and applies its envelope effect.
///
/// An expense charged to a bucket spends from that bucket (and is rejected
/// with [`Error::InsufficientBudget`] when there is no headroom); bucketed
/// income tops the bucket up. Unbucketed transactions only touch the log.
/// Row insert and envelope mutation happen in one store transaction.
pub async fn record_transaction(
    db: &DatabaseConnection,
    owner: &str,
    direction: Direction,
    amount: i64,
    date: NaiveDate,
    bucket: Option<Bucket>,
    description: String,
) -> Result<transaction::Model> {
    if amount <= 0 {
        return Err(Error::invalid_input("amount must be greater than 0"));
    }

    let txn = db.begin().await?;

    let model = transaction::ActiveModel {
        owner_id: Set(owner.to_string()),
        direction: Set(direction),
        amount: Set(amount),
        date: Set(date),
        bucket: Set(bucket),
        description: Set(description),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let inserted = model.insert(&txn).await?;

    match (direction, bucket) {
        (Direction::Expense, Some(b)) => envelope::spend(&txn, owner, b, amount).await?,
        (Direction::Income, Some(b)) => envelope::add_income(&txn, owner, b, amount).await?,
        _ => {}
    }

    txn.commit().await?;
    Ok(inserted)
}

/// Retrieves one transaction, checking ownership.
pub async fn get_transaction(
    db: &DatabaseConnection,
    owner: &str,
    id: i64,
) -> Result<transaction::Model> {
    Transaction::find_by_id(id)
        .filter(transaction::Column::OwnerId.eq(owner))
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound { id })
}

/// Lists all of an owner's transactions, newest first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    owner: &str,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Edits the non-identity fields of a transaction. Amount, direction, and
/// bucket are identity fields: changing them would desynchronize the
/// envelope, so corrections go through [`record_transaction`] and
/// [`envelope::refund`] instead.
pub async fn update_transaction(
    db: &DatabaseConnection,
    owner: &str,
    id: i64,
    changes: TransactionChanges,
) -> Result<transaction::Model> {
    if changes.is_empty() {
        return Err(Error::invalid_input("no fields to update"));
    }

    let existing = get_transaction(db, owner, id).await?;

    let mut active: transaction::ActiveModel = existing.into();
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(date) = changes.date {
        active.date = Set(date);
    }

    active.update(db).await.map_err(Into::into)
}

/// Deletes a transaction row. Envelope usage is left as-is; a spend that
/// should be undone is refunded explicitly, not erased.
pub async fn delete_transaction(db: &DatabaseConnection, owner: &str, id: i64) -> Result<()> {
    let result = Transaction::delete_many()
        .filter(transaction::Column::Id.eq(id))
        .filter(transaction::Column::OwnerId.eq(owner))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::TransactionNotFound { id });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::envelope::get_envelope;
    use crate::test_utils::{create_test_envelope, date, setup_test_db};

    #[tokio::test]
    async fn test_record_transaction_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = record_transaction(
            &db,
            "alice",
            Direction::Expense,
            0,
            date(2024, 1, 1),
            None,
            "zero".to_string(),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = record_transaction(
            &db,
            "alice",
            Direction::Income,
            -10,
            date(2024, 1, 1),
            None,
            "negative".to_string(),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_record_expense_spends_from_bucket() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_envelope(&db, "alice").await?; // needs_budget = 200

        let tx = record_transaction(
            &db,
            "alice",
            Direction::Expense,
            150,
            date(2024, 1, 5),
            Some(Bucket::Needs),
            "groceries".to_string(),
        )
        .await?;

        assert_eq!(tx.amount, 150);
        assert_eq!(tx.bucket, Some(Bucket::Needs));

        let env = get_envelope(&db, "alice").await?;
        assert_eq!(env.needs_used, 150);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_rejected_expense_writes_no_row() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_envelope(&db, "alice").await?; // needs_budget = 200

        let result = record_transaction(
            &db,
            "alice",
            Direction::Expense,
            500,
            date(2024, 1, 5),
            Some(Bucket::Needs),
            "too big".to_string(),
        )
        .await;
        assert!(matches!(result, Err(Error::InsufficientBudget { .. })));

        // The rejected spend must not leave a log row behind
        assert!(list_transactions(&db, "alice").await?.is_empty());
        let env = get_envelope(&db, "alice").await?;
        assert_eq!(env.needs_used, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_income_tops_up_bucket() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_envelope(&db, "alice").await?;

        record_transaction(
            &db,
            "alice",
            Direction::Income,
            100,
            date(2024, 1, 3),
            Some(Bucket::Savings),
            "bonus".to_string(),
        )
        .await?;

        let env = get_envelope(&db, "alice").await?;
        assert_eq!(env.weekly_income, 1100);
        assert_eq!(env.savings_budget, 600);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_unbucketed_touches_no_envelope() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_envelope(&db, "alice").await?;

        record_transaction(
            &db,
            "alice",
            Direction::Expense,
            75,
            date(2024, 1, 4),
            None,
            "cash withdrawal".to_string(),
        )
        .await?;

        let env = get_envelope(&db, "alice").await?;
        assert_eq!(env.needs_used, 0);
        assert_eq!(env.wants_used, 0);
        assert_eq!(env.savings_used, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_transaction_ownership() -> Result<()> {
        let db = setup_test_db().await?;

        let tx = record_transaction(
            &db,
            "alice",
            Direction::Income,
            50,
            date(2024, 1, 1),
            None,
            "salary".to_string(),
        )
        .await?;

        assert_eq!(get_transaction(&db, "alice", tx.id).await?.id, tx.id);

        // Same id, wrong owner
        let result = get_transaction(&db, "bob", tx.id).await;
        assert!(matches!(result, Err(Error::TransactionNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_transaction_non_identity_fields() -> Result<()> {
        let db = setup_test_db().await?;

        let tx = record_transaction(
            &db,
            "alice",
            Direction::Expense,
            30,
            date(2024, 1, 10),
            None,
            "lnch".to_string(),
        )
        .await?;

        let updated = update_transaction(
            &db,
            "alice",
            tx.id,
            TransactionChanges {
                description: Some("lunch".to_string()),
                date: Some(date(2024, 1, 11)),
            },
        )
        .await?;

        assert_eq!(updated.description, "lunch");
        assert_eq!(updated.date, date(2024, 1, 11));
        // Identity fields untouched
        assert_eq!(updated.amount, 30);
        assert_eq!(updated.direction, Direction::Expense);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_transaction_empty_changes() -> Result<()> {
        let db = setup_test_db().await?;

        let result =
            update_transaction(&db, "alice", 1, TransactionChanges::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_transaction() -> Result<()> {
        let db = setup_test_db().await?;

        let tx = record_transaction(
            &db,
            "alice",
            Direction::Income,
            40,
            date(2024, 1, 2),
            None,
            "gift".to_string(),
        )
        .await?;

        delete_transaction(&db, "alice", tx.id).await?;
        assert!(matches!(
            get_transaction(&db, "alice", tx.id).await,
            Err(Error::TransactionNotFound { .. })
        ));
        assert!(matches!(
            delete_transaction(&db, "alice", tx.id).await,
            Err(Error::TransactionNotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first() -> Result<()> {
        let db = setup_test_db().await?;

        let older = record_transaction(
            &db,
            "alice",
            Direction::Income,
            10,
            date(2024, 1, 1),
            None,
            "first".to_string(),
        )
        .await?;
        let newer = record_transaction(
            &db,
            "alice",
            Direction::Income,
            20,
            date(2024, 2, 1),
            None,
            "second".to_string(),
        )
        .await?;

        let all = list_transactions(&db, "alice").await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);

        Ok(())
    }
}
