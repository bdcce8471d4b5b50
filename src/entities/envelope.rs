//! Budget envelope entity - one row per owner.
//!
//! An envelope splits a weekly income into three buckets (needs/wants/savings)
//! and tracks allocation vs. usage for each. The savings bucket is special:
//! `savings_alloc` is the configured weekly slice and `savings_budget` is the
//! standing pool the slice rolls into every week; spends are checked against
//! the pool. All amounts are integers in the minor currency unit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget envelope database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_envelopes")]
pub struct Model {
    /// Unique identifier for the envelope
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the envelope; exactly one envelope per owner
    #[sea_orm(unique)]
    pub owner_id: String,
    /// Weekly income the allocation is computed from
    pub weekly_income: i64,
    /// Weekly needs allocation
    pub needs_budget: i64,
    /// Weekly wants allocation
    pub wants_budget: i64,
    /// Configured weekly savings slice (rolls into the pool each week)
    pub savings_alloc: i64,
    /// Standing savings pool; savings spends are checked against this
    pub savings_budget: i64,
    /// Amount spent from needs this week
    pub needs_used: i64,
    /// Amount spent from wants this week
    pub wants_used: i64,
    /// Amount spent from the savings pool this week
    pub savings_used: i64,
    /// When the envelope was created
    pub created_at: DateTimeUtc,
    /// When the envelope was last modified
    pub updated_at: DateTimeUtc,
}

/// Envelopes reference no other table directly; transactions and reports are
/// tied to the same owner, not to the envelope row.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
