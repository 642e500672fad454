//! Failure taxonomy for a reconciliation pass.

use thiserror::Error;

/// All errors that can abort or degrade a reconciliation pass.
///
/// Store-level anomalies inside an applied batch (duplicate key, update
/// matching no row) are logged at the call site instead of surfacing here,
/// so one misbehaving batch never takes the process down.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The spreadsheet or the rate feed was unreachable or returned a
    /// document we could not make sense of. The pass must end before any
    /// mutation; the next tick retries.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// The requested currency code has no record in the rate feed.
    /// Converting at an undefined rate is worse than skipping a cycle.
    #[error("currency code {0} not present in rate feed")]
    RateNotFound(String),

    /// A source row failed type coercion or date parsing. Whether this
    /// aborts the pass or skips the row is a configuration choice.
    #[error("row {index}: {reason}")]
    InvalidRow { index: usize, reason: String },

    /// A storage operation failed outright (connection, transaction).
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl SyncError {
    pub(crate) fn invalid_row(index: usize, reason: impl Into<String>) -> Self {
        SyncError::InvalidRow {
            index,
            reason: reason.into(),
        }
    }
}
