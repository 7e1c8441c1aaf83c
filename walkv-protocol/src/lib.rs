//! # walkv-protocol
//!
//! Wire protocol for walkv: every message, in both directions, is a JSON
//! object framed by a 4-byte big-endian length prefix.

pub mod error;
pub mod frame;
pub mod message;

pub use error::ProtocolError;
pub use frame::Frame;
pub use message::{Command, Reply};

/// Maximum framed payload size (16 MiB).
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Size of the length prefix in bytes.
pub const LEN_PREFIX_SIZE: usize = 4;
