/// Envelope lifecycle and atomic bucket operations
pub mod envelope;

/// Day/week/month aggregation of the transaction log
pub mod period;

/// Weekly savings rollover and usage reset
pub mod rollover;

/// Statement generation and persisted period reports
pub mod statement;

/// Transaction log operations
pub mod transaction;
