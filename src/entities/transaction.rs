//! Transaction entity - the append-only money movement log.
//!
//! Each row records one movement of money for one owner: a `direction`
//! (income or expense), a positive `amount` in the minor currency unit, the
//! calendar `date` it applies to, and an optional budget `bucket`. Rows are
//! written once and only non-identity fields (description, date) may be
//! edited afterward; balances are always reconstructed by replaying rows,
//! never by rewriting them.

use crate::errors::Error;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Direction of a money movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money coming in
    #[sea_orm(string_value = "income")]
    Income,
    /// Money going out
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// One of the three envelope buckets. The set is closed and known at compile
/// time, so aggregation results use one field per bucket instead of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    /// Essential spending (rent, groceries, bills)
    #[sea_orm(string_value = "needs")]
    Needs,
    /// Discretionary spending
    #[sea_orm(string_value = "wants")]
    Wants,
    /// The savings pool
    #[sea_orm(string_value = "savings")]
    Savings,
}

impl Direction {
    /// Canonical lowercase name, matching the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Income => "income",
            Direction::Expense => "expense",
        }
    }
}

impl Bucket {
    /// Canonical lowercase name, matching the stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Bucket::Needs => "needs",
            Bucket::Wants => "wants",
            Bucket::Savings => "savings",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Direction::Income),
            "expense" => Ok(Direction::Expense),
            other => Err(Error::invalid_input(format!(
                "unknown transaction direction: {other}"
            ))),
        }
    }
}

impl FromStr for Bucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "needs" => Ok(Bucket::Needs),
            "wants" => Ok(Bucket::Wants),
            "savings" => Ok(Bucket::Savings),
            other => Err(Error::invalid_input(format!("unknown bucket: {other}"))),
        }
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner the transaction belongs to
    pub owner_id: String,
    /// Whether this is income or an expense
    pub direction: Direction,
    /// Amount in the minor currency unit, always positive
    pub amount: i64,
    /// Calendar date the movement applies to (timezone-naive)
    pub date: Date,
    /// Budget bucket the movement is charged to, if any
    pub bucket: Option<Bucket>,
    /// Human-readable description of the transaction
    pub description: String,
    /// When the row was written; tie-break for same-date ordering
    pub created_at: DateTimeUtc,
}

/// Transactions are tied to an owner by id, not to other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
