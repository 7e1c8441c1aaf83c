//! Client error types.

use thiserror::Error;

/// Errors from the client library.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] walkv_protocol::ProtocolError),

    #[error("server error: {0}")]
    Server(String),

    #[error("connection closed by server")]
    ConnectionClosed,

    #[error("unexpected reply: {0}")]
    UnexpectedReply(String),
}
