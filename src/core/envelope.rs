//! Budget envelope business logic.
//!
//! Owns the three-bucket envelope invariants: every numeric field stays
//! non-negative, usage never exceeds the bucket's budget, and the allocation
//! never exceeds the weekly income at allocation time. The mutating
//! operations that can race (`spend`, `refund`, `add_income`) are each a
//! single conditional `UPDATE` evaluated by the store, so two concurrent
//! spends can never both observe headroom and jointly overspend. No
//! application-level locks are held across store round-trips.

use crate::{
    entities::{Bucket, Envelope, envelope},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait, prelude::*};

/// Budget allocation percentages for the three buckets.
///
/// The default follows the 50/30/20 rule: 50% savings, 30% wants, 20% needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocation {
    /// Percentage of weekly income allocated to savings
    pub savings_percent: f64,
    /// Percentage of weekly income allocated to wants
    pub wants_percent: f64,
    /// Percentage of weekly income allocated to needs
    pub needs_percent: f64,
}

impl Default for Allocation {
    fn default() -> Self {
        Allocation {
            savings_percent: 50.0,
            wants_percent: 30.0,
            needs_percent: 20.0,
        }
    }
}

impl Allocation {
    /// Validates the percentages: each must be a finite value in `[0, 100]`
    /// and their sum must not exceed 100.
    pub fn validate(&self) -> Result<()> {
        let percents = [
            self.savings_percent,
            self.wants_percent,
            self.needs_percent,
        ];
        if percents.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(Error::invalid_input(
                "allocation percentages must be non-negative",
            ));
        }
        let total: f64 = percents.iter().sum();
        if total > 100.0 {
            return Err(Error::invalid_input(format!(
                "allocation percentages sum to {total}, which exceeds 100"
            )));
        }
        Ok(())
    }
}

/// Bucket amount for a percentage of the weekly income, truncated to the
/// minor currency unit.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn bucket_amount(weekly_income: i64, percent: f64) -> i64 {
    ((weekly_income as f64) * (percent / 100.0)).floor() as i64
}

/// Usage column for a bucket.
const fn used_column(bucket: Bucket) -> envelope::Column {
    match bucket {
        Bucket::Needs => envelope::Column::NeedsUsed,
        Bucket::Wants => envelope::Column::WantsUsed,
        Bucket::Savings => envelope::Column::SavingsUsed,
    }
}

/// Budget column a spend is checked against. For savings this is the
/// standing pool, not the weekly slice.
const fn budget_column(bucket: Bucket) -> envelope::Column {
    match bucket {
        Bucket::Needs => envelope::Column::NeedsBudget,
        Bucket::Wants => envelope::Column::WantsBudget,
        Bucket::Savings => envelope::Column::SavingsBudget,
    }
}

/// Remaining headroom in a bucket.
#[must_use]
pub fn remaining(env: &envelope::Model, bucket: Bucket) -> i64 {
    match bucket {
        Bucket::Needs => env.needs_budget - env.needs_used,
        Bucket::Wants => env.wants_budget - env.wants_used,
        Bucket::Savings => env.savings_budget - env.savings_used,
    }
}

async fn find_by_owner<C>(conn: &C, owner: &str) -> Result<Option<envelope::Model>>
where
    C: ConnectionTrait,
{
    Envelope::find()
        .filter(envelope::Column::OwnerId.eq(owner))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Creates the envelope for an owner, splitting the weekly income across the
/// three buckets per the allocation (default 50/30/20 savings/wants/needs).
/// The savings pool starts equal to the weekly savings slice.
///
/// Fails with [`Error::EnvelopeExists`] when the owner already has an
/// envelope and with [`Error::InvalidInput`] for a non-positive income or a
/// bad allocation.
pub async fn create_envelope(
    db: &DatabaseConnection,
    owner: &str,
    weekly_income: i64,
    allocation: Option<Allocation>,
) -> Result<envelope::Model> {
    if weekly_income <= 0 {
        return Err(Error::invalid_input(
            "weekly income must be greater than 0",
        ));
    }
    let allocation = allocation.unwrap_or_default();
    allocation.validate()?;

    if find_by_owner(db, owner).await?.is_some() {
        return Err(Error::EnvelopeExists {
            owner: owner.to_string(),
        });
    }

    let savings = bucket_amount(weekly_income, allocation.savings_percent);
    let now = Utc::now();
    let model = envelope::ActiveModel {
        owner_id: Set(owner.to_string()),
        weekly_income: Set(weekly_income),
        needs_budget: Set(bucket_amount(weekly_income, allocation.needs_percent)),
        wants_budget: Set(bucket_amount(weekly_income, allocation.wants_percent)),
        savings_alloc: Set(savings),
        savings_budget: Set(savings),
        needs_used: Set(0),
        wants_used: Set(0),
        savings_used: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    model.insert(db).await.map_err(Into::into)
}

/// Re-allocates an existing envelope from a new income and allocation.
///
/// Usage counters are clamped to the new (possibly smaller) bucket sizes
/// rather than reset, preserving already-spent history. The accumulated
/// savings pool is preserved; only the weekly savings slice is recomputed.
pub async fn update_envelope(
    db: &DatabaseConnection,
    owner: &str,
    weekly_income: i64,
    allocation: Option<Allocation>,
) -> Result<envelope::Model> {
    if weekly_income <= 0 {
        return Err(Error::invalid_input(
            "weekly income must be greater than 0",
        ));
    }
    let allocation = allocation.unwrap_or_default();
    allocation.validate()?;

    let txn = db.begin().await?;

    let existing = find_by_owner(&txn, owner)
        .await?
        .ok_or_else(|| Error::EnvelopeNotFound {
            owner: owner.to_string(),
        })?;

    let needs = bucket_amount(weekly_income, allocation.needs_percent);
    let wants = bucket_amount(weekly_income, allocation.wants_percent);
    let savings = bucket_amount(weekly_income, allocation.savings_percent);

    let mut active: envelope::ActiveModel = existing.clone().into();
    active.weekly_income = Set(weekly_income);
    active.needs_budget = Set(needs);
    active.wants_budget = Set(wants);
    active.savings_alloc = Set(savings);
    active.needs_used = Set(existing.needs_used.min(needs));
    active.wants_used = Set(existing.wants_used.min(wants));
    active.savings_used = Set(existing.savings_used.min(existing.savings_budget));
    active.updated_at = Set(Utc::now());

    let updated = active.update(&txn).await?;
    txn.commit().await?;

    Ok(updated)
}

/// Retrieves the envelope for an owner.
pub async fn get_envelope(db: &DatabaseConnection, owner: &str) -> Result<envelope::Model> {
    find_by_owner(db, owner)
        .await?
        .ok_or_else(|| Error::EnvelopeNotFound {
            owner: owner.to_string(),
        })
}

/// Deletes the envelope for an owner. The transaction log is untouched.
pub async fn delete_envelope(db: &DatabaseConnection, owner: &str) -> Result<()> {
    let result = Envelope::delete_many()
        .filter(envelope::Column::OwnerId.eq(owner))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::EnvelopeNotFound {
            owner: owner.to_string(),
        });
    }
    Ok(())
}

/// Spends from a bucket.
///
/// The check-and-increment is one conditional `UPDATE`:
/// `SET used = used + amount WHERE owner AND budget >= used + amount`.
/// The store evaluates the guard row-atomically, so racing spends cannot
/// jointly overspend. Zero rows affected means either the envelope is
/// missing or the headroom was insufficient; a re-read distinguishes the
/// two for the caller.
pub async fn spend<C>(conn: &C, owner: &str, bucket: Bucket, amount: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount <= 0 {
        return Err(Error::invalid_input("spend amount must be greater than 0"));
    }

    let used = used_column(bucket);
    let budget = budget_column(bucket);

    let result = Envelope::update_many()
        .col_expr(used, Expr::col(used).add(amount))
        .col_expr(envelope::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(envelope::Column::OwnerId.eq(owner))
        .filter(Expr::col(budget).gte(Expr::col(used).add(amount)))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let env = find_by_owner(conn, owner)
            .await?
            .ok_or_else(|| Error::EnvelopeNotFound {
                owner: owner.to_string(),
            })?;
        return Err(Error::InsufficientBudget {
            bucket,
            remaining: remaining(&env, bucket),
            requested: amount,
        });
    }

    Ok(())
}

/// Refunds a previous spend back into a bucket.
///
/// Over-refunding clamps usage at zero instead of erroring: the guarded
/// decrement (`WHERE used >= amount`) is tried first, and when the guard
/// fails the counter is written to zero.
pub async fn refund<C>(conn: &C, owner: &str, bucket: Bucket, amount: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount <= 0 {
        return Err(Error::invalid_input(
            "refund amount must be greater than 0",
        ));
    }

    let used = used_column(bucket);

    let result = Envelope::update_many()
        .col_expr(used, Expr::col(used).sub(amount))
        .col_expr(envelope::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(envelope::Column::OwnerId.eq(owner))
        .filter(Expr::col(used).gte(amount))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        let clamped = Envelope::update_many()
            .col_expr(used, Expr::value(0i64))
            .col_expr(envelope::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(envelope::Column::OwnerId.eq(owner))
            .exec(conn)
            .await?;
        if clamped.rows_affected == 0 {
            return Err(Error::EnvelopeNotFound {
                owner: owner.to_string(),
            });
        }
    }

    Ok(())
}

/// Records ad-hoc income directly into a bucket: one atomic `UPDATE` that
/// grows both the weekly income and the target bucket's budget (the pool,
/// for savings).
pub async fn add_income<C>(conn: &C, owner: &str, bucket: Bucket, amount: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    if amount <= 0 {
        return Err(Error::invalid_input(
            "income amount must be greater than 0",
        ));
    }

    let budget = budget_column(bucket);

    let result = Envelope::update_many()
        .col_expr(
            envelope::Column::WeeklyIncome,
            Expr::col(envelope::Column::WeeklyIncome).add(amount),
        )
        .col_expr(budget, Expr::col(budget).add(amount))
        .col_expr(envelope::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(envelope::Column::OwnerId.eq(owner))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::EnvelopeNotFound {
            owner: owner.to_string(),
        });
    }

    Ok(())
}
