//! Period report entity - immutable persisted statements.
//!
//! A row is written once by the statement generator for a given
//! `(owner, period_start, period_end)` and never updated. `report_data`
//! holds the serialized statement; generation is append-only, so the same
//! range can legitimately appear in several rows with distinct ids.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Period report database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "period_reports")]
pub struct Model {
    /// Unique identifier for the report
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner the report was generated for
    pub owner_id: String,
    /// First day of the reported range (inclusive)
    pub period_start: Date,
    /// Last day of the reported range (inclusive)
    pub period_end: Date,
    /// Serialized statement (JSON)
    #[sea_orm(column_type = "Text")]
    pub report_data: String,
    /// When the statement was generated
    pub generated_at: DateTimeUtc,
}

/// Reports are tied to an owner by id, not to other tables.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
