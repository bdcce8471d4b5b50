//! Statement generation business logic.
//!
//! Builds a balance-sheet view of an arbitrary date range by replaying the
//! transaction log: overall starting/ending balance, per-bucket movement,
//! and the transaction lines for the range. The computed statement is
//! serialized and persisted as an immutable period report row. Persisting
//! is the last step, after every read succeeded, so a failed generation
//! never leaves a partial report behind. Storage is append-only: generating
//! twice for the same range yields two rows with identical figures and
//! distinct ids.

use crate::{
    entities::{
        Bucket, Direction, PeriodReport, Transaction, period_report, transaction,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{DatabaseConnection, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Inclusive date range a statement covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    /// First day of the range
    pub start: NaiveDate,
    /// Last day of the range
    pub end: NaiveDate,
}

/// Movement of one bucket over the statement range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketBalance {
    /// Net position of the bucket before the range
    pub starting: i64,
    /// Bucketed income inside the range
    #[serde(rename = "in")]
    pub incoming: i64,
    /// Bucketed expenses inside the range
    #[serde(rename = "out")]
    pub outgoing: i64,
    /// `starting + in - out`
    pub ending: i64,
}

/// Per-bucket movement, one field per bucket. The bucket set is closed, so
/// a fixed struct replaces a map and makes missing-key states impossible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketBalances {
    /// Needs bucket movement
    pub needs: BucketBalance,
    /// Wants bucket movement
    pub wants: BucketBalance,
    /// Savings bucket movement
    pub savings: BucketBalance,
}

impl BucketBalances {
    fn bucket_mut(&mut self, bucket: Bucket) -> &mut BucketBalance {
        match bucket {
            Bucket::Needs => &mut self.needs,
            Bucket::Wants => &mut self.wants,
            Bucket::Savings => &mut self.savings,
        }
    }
}

/// One transaction line inside the statement range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// Transaction id
    pub id: i64,
    /// Calendar date of the movement
    pub date: NaiveDate,
    /// Description of the movement
    pub description: String,
    /// Income or expense
    pub direction: Direction,
    /// Bucket the movement was charged to, if any
    pub bucket: Option<Bucket>,
    /// Amount in the minor currency unit
    pub amount: i64,
}

/// A computed point-in-time statement; also the shape persisted as
/// `report_data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// When the statement was computed
    pub generated_at: DateTimeUtc,
    /// Range the statement covers
    pub period: PeriodWindow,
    /// Net balance over all transactions dated before the range
    pub starting_balance: i64,
    /// Net balance over all transactions dated up to and including the end
    pub ending_balance: i64,
    /// Per-bucket movement; unbucketed transactions are excluded here but
    /// included in the overall balances
    pub buckets: BucketBalances,
    /// Sum of the three bucket endings - a reconciliation figure that only
    /// matches `ending_balance` when every transaction is bucketed
    pub total_buckets: i64,
    /// Transactions inside the range, ascending `(date, created_at)`
    pub transactions: Vec<StatementLine>,
}

/// Replays the transaction log to build a statement for `[start, end]` and
/// persists it as a new period report row.
///
/// Returns the computed statement together with the stored row. Fails with
/// [`Error::InvalidInput`] when `start > end`; any store failure aborts
/// before the report row is written.
pub async fn generate_statement(
    db: &DatabaseConnection,
    owner: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(Statement, period_report::Model)> {
    if start > end {
        return Err(Error::invalid_input(
            "period start must not be after period end",
        ));
    }

    let rows = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner))
        .filter(transaction::Column::Date.lte(end))
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::CreatedAt)
        .all(db)
        .await?;

    let mut starting_balance = 0;
    let mut ending_balance = 0;
    let mut buckets = BucketBalances::default();
    let mut lines = Vec::new();

    for row in rows {
        let signed = match row.direction {
            Direction::Income => row.amount,
            Direction::Expense => -row.amount,
        };
        ending_balance += signed;

        if row.date < start {
            starting_balance += signed;
            if let Some(bucket) = row.bucket {
                buckets.bucket_mut(bucket).starting += signed;
            }
        } else {
            if let Some(bucket) = row.bucket {
                let balance = buckets.bucket_mut(bucket);
                match row.direction {
                    Direction::Income => balance.incoming += row.amount,
                    Direction::Expense => balance.outgoing += row.amount,
                }
            }
            lines.push(StatementLine {
                id: row.id,
                date: row.date,
                description: row.description,
                direction: row.direction,
                bucket: row.bucket,
                amount: row.amount,
            });
        }
    }

    for bucket in [Bucket::Needs, Bucket::Wants, Bucket::Savings] {
        let balance = buckets.bucket_mut(bucket);
        balance.ending = balance.starting + balance.incoming - balance.outgoing;
    }
    let total_buckets = buckets.needs.ending + buckets.wants.ending + buckets.savings.ending;

    let statement = Statement {
        generated_at: Utc::now(),
        period: PeriodWindow { start, end },
        starting_balance,
        ending_balance,
        buckets,
        total_buckets,
        transactions: lines,
    };

    // All reads are done; writing the report row is the final step
    let report_data = serde_json::to_string(&statement)?;
    let stored = period_report::ActiveModel {
        owner_id: Set(owner.to_string()),
        period_start: Set(start),
        period_end: Set(end),
        report_data: Set(report_data),
        generated_at: Set(statement.generated_at),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok((statement, stored))
}

/// Lists an owner's stored reports, newest first.
pub async fn list_reports(
    db: &DatabaseConnection,
    owner: &str,
) -> Result<Vec<period_report::Model>> {
    PeriodReport::find()
        .filter(period_report::Column::OwnerId.eq(owner))
        .order_by_desc(period_report::Column::GeneratedAt)
        .order_by_desc(period_report::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one stored report, checking ownership.
pub async fn get_report(
    db: &DatabaseConnection,
    owner: &str,
    id: i64,
) -> Result<period_report::Model> {
    PeriodReport::find_by_id(id)
        .filter(period_report::Column::OwnerId.eq(owner))
        .one(db)
        .await?
        .ok_or(Error::ReportNotFound { id })
}

/// Parses the statement stored inside a report row.
pub fn decode_report(report: &period_report::Model) -> Result<Statement> {
    serde_json::from_str(&report.report_data).map_err(Into::into)
}
