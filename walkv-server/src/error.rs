//! Server error types.

use thiserror::Error;

/// Errors from the server layer.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] walkv_protocol::ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] walkv_storage::StoreError),
}
