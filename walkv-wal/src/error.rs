//! WAL error types.

use thiserror::Error;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record checksum mismatch for seq {seq_num}: stored {stored:#010x}, computed {computed:#010x}")]
    Checksum {
        seq_num: u64,
        stored: u32,
        computed: u32,
    },

    #[error("malformed record: {0}")]
    Format(String),

    #[error("unsupported entry format version: {0}")]
    UnsupportedVersion(u8),

    #[error("unknown compression algorithm byte: {0}")]
    UnknownCompression(u8),

    #[error("torn record in segment {segment} at offset {offset}; only the final segment may have a torn tail")]
    TornSegment { segment: u64, offset: u64 },

    #[error("WAL is closed")]
    Closed,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WalError {
    /// Returns whether this error indicates on-disk corruption (as opposed
    /// to a transient I/O failure).
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            WalError::Checksum { .. }
                | WalError::Format(_)
                | WalError::UnsupportedVersion(_)
                | WalError::UnknownCompression(_)
                | WalError::TornSegment { .. }
        )
    }
}
