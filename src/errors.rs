//! Unified error handling for the ledger engine.
//!
//! Every fallible operation in this crate returns [`Result`]. Variants map
//! one-to-one onto caller-visible failure classes so a request layer can
//! render validation failures (400-style) separately from budget conflicts
//! (409-style) without string matching.

use crate::entities::Bucket;
use thiserror::Error;

/// All errors produced by the ledger core.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-correctable input problem: non-positive amount, unknown
    /// bucket/granularity, allocation percentages out of range.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Human-readable description of what was wrong
        message: String,
    },

    /// No envelope exists for the given owner.
    #[error("no budget envelope exists for owner {owner}")]
    EnvelopeNotFound {
        /// Owner whose envelope was requested
        owner: String,
    },

    /// Envelope creation was attempted for an owner that already has one.
    #[error("a budget envelope already exists for owner {owner}")]
    EnvelopeExists {
        /// Owner that already has an envelope
        owner: String,
    },

    /// The transaction does not exist or belongs to a different owner.
    #[error("transaction {id} not found")]
    TransactionNotFound {
        /// Requested transaction id
        id: i64,
    },

    /// The period report does not exist or belongs to a different owner.
    #[error("period report {id} not found")]
    ReportNotFound {
        /// Requested report id
        id: i64,
    },

    /// A spend would exceed the remaining headroom in the target bucket.
    #[error("insufficient {bucket} budget: {remaining} remaining, {requested} requested")]
    InsufficientBudget {
        /// Bucket the spend was charged against
        bucket: Bucket,
        /// Headroom left in the bucket at the time of the attempt
        remaining: i64,
        /// Amount the caller tried to spend
        requested: i64,
    },

    /// Configuration error (missing/unparseable settings).
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the configuration problem
        message: String,
    },

    /// Underlying store read/write failure. Fatal for the current
    /// operation; retries belong to the caller.
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    /// Statement blob could not be encoded or decoded.
    #[error("statement encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
