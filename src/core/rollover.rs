//! Weekly rollover business logic.
//!
//! At each ISO week boundary every envelope gets a fresh week: the unspent
//! savings slice rolls into the standing savings pool and all three usage
//! counters reset to zero. The `system_state` table carries a marker with
//! the last processed ISO week so the sweep runs at most once per week no
//! matter how often the scheduler fires.

use crate::{
    entities::{Envelope, SystemState, envelope, system_state},
    errors::Result,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{Set, prelude::*};

const LAST_WEEKLY_ROLLOVER_KEY: &str = "last_weekly_rollover";

/// Result of the weekly rollover for a single envelope.
#[derive(Debug, Clone)]
pub struct EnvelopeRolloverResult {
    /// Owner of the envelope that rolled over
    pub owner_id: String,
    /// Savings pool before the rollover
    pub old_savings_pool: i64,
    /// Savings pool after the slice was added
    pub new_savings_pool: i64,
    /// Weekly savings slice that was rolled in
    pub savings_alloc: i64,
}

/// Result of one full weekly rollover sweep.
#[derive(Debug, Clone)]
pub struct WeeklyRolloverSummary {
    /// Per-envelope results, in sweep order
    pub rolled_envelopes: Vec<EnvelopeRolloverResult>,
    /// Number of envelopes that rolled over
    pub total_envelopes_processed: usize,
    /// Number of envelopes whose reset failed and was skipped
    pub failed_count: usize,
    /// ISO week the sweep ran for (e.g. `"2024-W03"`)
    pub week: String,
}

/// ISO year-week key for the current date, e.g. `"2024-W03"`.
fn current_week_key() -> String {
    Utc::now().date_naive().format("%G-W%V").to_string()
}

/// Reads the ISO week of the last completed rollover, if any.
pub async fn get_last_rollover_week(db: &DatabaseConnection) -> Result<Option<String>> {
    let state = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_WEEKLY_ROLLOVER_KEY))
        .one(db)
        .await?;
    Ok(state.map(|s| s.value))
}

async fn set_last_rollover_week<C>(db: &C, week: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = SystemState::find()
        .filter(system_state::Column::Key.eq(LAST_WEEKLY_ROLLOVER_KEY))
        .one(db)
        .await?;

    if let Some(state) = existing {
        let mut active_model: system_state::ActiveModel = state.into();
        active_model.value = Set(week.to_string());
        active_model.updated_at = Set(Utc::now());
        active_model.update(db).await?;
    } else {
        let new_state = system_state::ActiveModel {
            key: Set(LAST_WEEKLY_ROLLOVER_KEY.to_string()),
            value: Set(week.to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Whether the rollover has not yet run in the current ISO week.
pub async fn is_rollover_due(db: &DatabaseConnection) -> Result<bool> {
    let last = get_last_rollover_week(db).await?;
    Ok(last.as_deref() != Some(current_week_key().as_str()))
}

/// Rolls one envelope into the new week with a single atomic update:
/// the savings slice joins the pool and every usage counter resets.
async fn reset_envelope_for_week(db: &DatabaseConnection, envelope_id: i64) -> Result<()> {
    Envelope::update_many()
        .col_expr(
            envelope::Column::SavingsBudget,
            Expr::col(envelope::Column::SavingsBudget).add(Expr::col(envelope::Column::SavingsAlloc)),
        )
        .col_expr(envelope::Column::NeedsUsed, Expr::value(0i64))
        .col_expr(envelope::Column::WantsUsed, Expr::value(0i64))
        .col_expr(envelope::Column::SavingsUsed, Expr::value(0i64))
        .col_expr(envelope::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(envelope::Column::Id.eq(envelope_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Runs the weekly rollover sweep if it has not run this ISO week yet.
///
/// Returns `Ok(None)` when the current week was already processed. A
/// failure on one envelope is logged and skipped so a single bad row
/// cannot starve every other owner; the week marker is stamped after the
/// sweep, so skipped envelopes are not retried until the next week.
pub async fn run_weekly_rollover(
    db: &DatabaseConnection,
) -> Result<Option<WeeklyRolloverSummary>> {
    if !is_rollover_due(db).await? {
        return Ok(None);
    }

    let week = current_week_key();
    let envelopes = Envelope::find().all(db).await?;

    let mut results = Vec::new();
    let mut failed_count = 0;

    for env in envelopes {
        match reset_envelope_for_week(db, env.id).await {
            Ok(()) => {
                results.push(EnvelopeRolloverResult {
                    owner_id: env.owner_id,
                    old_savings_pool: env.savings_budget,
                    new_savings_pool: env.savings_budget + env.savings_alloc,
                    savings_alloc: env.savings_alloc,
                });
            }
            Err(error) => {
                failed_count += 1;
                tracing::error!(
                    owner_id = %env.owner_id,
                    %error,
                    "weekly rollover failed for envelope, skipping"
                );
            }
        }
    }

    set_last_rollover_week(db, &week).await?;

    Ok(Some(WeeklyRolloverSummary {
        total_envelopes_processed: results.len(),
        failed_count,
        rolled_envelopes: results,
        week,
    }))
}

/// Formats a rollover summary for logging.
#[must_use]
pub fn format_rollover_summary(summary: &WeeklyRolloverSummary) -> String {
    use std::fmt::Write;

    let mut out = format!(
        "Weekly Rollover - {} - Processed {} envelopes ({} failed)\n",
        summary.week, summary.total_envelopes_processed, summary.failed_count
    );

    for result in &summary.rolled_envelopes {
        // write! to a String is infallible
        writeln!(
            out,
            "  {} | savings pool {} -> {} (+{})",
            result.owner_id,
            result.old_savings_pool,
            result.new_savings_pool,
            result.savings_alloc
        )
        .unwrap();
    }

    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::envelope::{create_envelope, get_envelope, spend};
    use crate::entities::Bucket;
    use crate::test_utils::{create_test_envelope, setup_test_db};

    #[tokio::test]
    async fn test_rollover_due_with_no_marker() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(get_last_rollover_week(&db).await?.is_none());
        assert!(is_rollover_due(&db).await?);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_last_rollover_week_upserts() -> Result<()> {
        let db = setup_test_db().await?;

        set_last_rollover_week(&db, "2024-W01").await?;
        set_last_rollover_week(&db, "2024-W02").await?;

        assert_eq!(
            get_last_rollover_week(&db).await?,
            Some("2024-W02".to_string())
        );

        // Upsert, not append
        let count = SystemState::find()
            .filter(system_state::Column::Key.eq(LAST_WEEKLY_ROLLOVER_KEY))
            .count(&db)
            .await?;
        assert_eq!(count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_accrues_pool_and_resets_usage() -> Result<()> {
        let db = setup_test_db().await?;
        // income 1000 -> needs 200, wants 300, savings slice/pool 500
        create_test_envelope(&db, "alice").await?;

        spend(&db, "alice", Bucket::Needs, 150).await?;
        spend(&db, "alice", Bucket::Savings, 100).await?;

        let summary = run_weekly_rollover(&db).await?.unwrap();
        assert_eq!(summary.total_envelopes_processed, 1);
        assert_eq!(summary.failed_count, 0);
        assert_eq!(summary.rolled_envelopes[0].old_savings_pool, 500);
        assert_eq!(summary.rolled_envelopes[0].new_savings_pool, 1000);

        let env = get_envelope(&db, "alice").await?;
        assert_eq!(env.savings_budget, 1000);
        assert_eq!(env.savings_alloc, 500);
        assert_eq!(env.needs_used, 0);
        assert_eq!(env.wants_used, 0);
        assert_eq!(env.savings_used, 0);
        // Weekly allocations are untouched
        assert_eq!(env.needs_budget, 200);
        assert_eq!(env.wants_budget, 300);

        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_runs_at_most_once_per_week() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_envelope(&db, "alice").await?;

        let first = run_weekly_rollover(&db).await?;
        assert!(first.is_some());

        let second = run_weekly_rollover(&db).await?;
        assert!(second.is_none());

        // Pool accrued exactly once
        let env = get_envelope(&db, "alice").await?;
        assert_eq!(env.savings_budget, 1000);

        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_sweeps_every_envelope() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_envelope(&db, "alice").await?;
        create_envelope(&db, "bob", 2000, None).await?; // savings slice 1000

        let summary = run_weekly_rollover(&db).await?.unwrap();
        assert_eq!(summary.total_envelopes_processed, 2);

        assert_eq!(get_envelope(&db, "alice").await?.savings_budget, 1000);
        assert_eq!(get_envelope(&db, "bob").await?.savings_budget, 2000);

        Ok(())
    }

    #[tokio::test]
    async fn test_rollover_empty_database_still_stamps_marker() -> Result<()> {
        let db = setup_test_db().await?;

        let summary = run_weekly_rollover(&db).await?.unwrap();
        assert_eq!(summary.total_envelopes_processed, 0);
        assert!(summary.rolled_envelopes.is_empty());

        assert!(!is_rollover_due(&db).await?);

        Ok(())
    }

    #[test]
    fn test_format_rollover_summary() {
        let summary = WeeklyRolloverSummary {
            total_envelopes_processed: 2,
            failed_count: 1,
            week: "2024-W03".to_string(),
            rolled_envelopes: vec![
                EnvelopeRolloverResult {
                    owner_id: "alice".to_string(),
                    old_savings_pool: 500,
                    new_savings_pool: 1000,
                    savings_alloc: 500,
                },
                EnvelopeRolloverResult {
                    owner_id: "bob".to_string(),
                    old_savings_pool: 0,
                    new_savings_pool: 250,
                    savings_alloc: 250,
                },
            ],
        };

        let text = format_rollover_summary(&summary);
        assert!(text.contains("2024-W03"));
        assert!(text.contains("Processed 2 envelopes (1 failed)"));
        assert!(text.contains("alice | savings pool 500 -> 1000 (+500)"));
        assert!(text.contains("bob | savings pool 0 -> 250 (+250)"));
    }
}
