//! Period aggregation business logic.
//!
//! Groups an owner's transaction log into day, ISO-week, or calendar-month
//! buckets and computes per-group and grand-total income/expense/net.
//! Groups come back most-recent-first; transactions inside a group keep
//! ascending `(date, created_at)` order so ties are deterministic.

use crate::{
    entities::{Direction, Transaction, transaction},
    errors::{Error, Result},
};
use chrono::{Datelike, Days, NaiveDate};
use sea_orm::{DatabaseConnection, QueryOrder, prelude::*};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Truncation unit used to derive a period key from a transaction date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One group per calendar day
    Daily,
    /// One group per ISO week (keyed by its Monday)
    Weekly,
    /// One group per calendar month (keyed by its first day)
    Monthly,
}

impl Granularity {
    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            other => Err(Error::invalid_input(format!(
                "unknown period granularity: {other}"
            ))),
        }
    }
}

/// Income/expense/net sums for one group or for the whole log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodTotals {
    /// Sum of income amounts
    pub income: i64,
    /// Sum of expense amounts
    pub expense: i64,
    /// `income - expense`
    pub net: i64,
}

/// One period bucket with its transactions and sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodGroup {
    /// Truncated period key (day, ISO-week Monday, or first of month)
    pub period: NaiveDate,
    /// Transactions in the period, ascending `(date, created_at)`
    pub transactions: Vec<transaction::Model>,
    /// Per-group sums
    pub totals: PeriodTotals,
}

/// Result of [`group_by_period`]: groups newest-first plus a grand total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSummary {
    /// Period groups, sorted by period key descending
    pub groups: Vec<PeriodGroup>,
    /// Grand total over every transaction
    pub total: PeriodTotals,
}

/// Truncates a date to its period key.
#[must_use]
pub fn period_key(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Daily => date,
        Granularity::Weekly => {
            let offset = u64::from(date.weekday().num_days_from_monday());
            date.checked_sub_days(Days::new(offset)).unwrap_or(date)
        }
        Granularity::Monthly => date.with_day(1).unwrap_or(date),
    }
}

/// Groups an owner's transactions into period buckets.
///
/// An empty log yields zero groups and a zero-valued total, not an error.
pub async fn group_by_period(
    db: &DatabaseConnection,
    owner: &str,
    granularity: Granularity,
) -> Result<PeriodSummary> {
    let rows = Transaction::find()
        .filter(transaction::Column::OwnerId.eq(owner))
        .order_by_asc(transaction::Column::Date)
        .order_by_asc(transaction::Column::CreatedAt)
        .all(db)
        .await?;

    let mut grouped: BTreeMap<NaiveDate, PeriodGroup> = BTreeMap::new();
    let mut total = PeriodTotals::default();

    for row in rows {
        let key = period_key(row.date, granularity);
        let group = grouped.entry(key).or_insert_with(|| PeriodGroup {
            period: key,
            transactions: Vec::new(),
            totals: PeriodTotals::default(),
        });

        match row.direction {
            Direction::Income => {
                group.totals.income += row.amount;
                total.income += row.amount;
            }
            Direction::Expense => {
                group.totals.expense += row.amount;
                total.expense += row.amount;
            }
        }
        group.transactions.push(row);
    }

    total.net = total.income - total.expense;

    // BTreeMap iterates keys ascending; reverse for most-recent-first
    let groups = grouped
        .into_values()
        .rev()
        .map(|mut group| {
            group.totals.net = group.totals.income - group.totals.expense;
            group
        })
        .collect();

    Ok(PeriodSummary { groups, total })
}
