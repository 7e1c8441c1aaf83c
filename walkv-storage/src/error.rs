//! Store error types.

use thiserror::Error;

/// Errors from the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAL error: {0}")]
    Wal(#[from] walkv_wal::WalError),

    #[error("key must be a non-empty string")]
    EmptyKey,
}

impl StoreError {
    /// Returns whether this error indicates on-disk corruption.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Wal(e) if e.is_corruption())
    }
}
