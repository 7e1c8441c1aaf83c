//! # walkv-wal
//!
//! Segmented write-ahead log for walkv.
//!
//! This crate provides a durable, append-only log with:
//! - Per-record CRC-32 checksums for corruption detection
//! - A per-record compression envelope (raw or zlib)
//! - Size-based segment rotation
//! - Ordered replay with torn-tail recovery

pub mod codec;
pub mod entry;
pub mod error;
pub mod segment;
pub mod wal;

pub use codec::{CompressionConfig, CompressionType, RecordCodec};
pub use entry::{LogEntry, OpType};
pub use error::WalError;
pub use segment::{SegmentScanner, SegmentWriter};
pub use wal::{Wal, WalConfig};

/// Default segment size (10 MiB).
pub const DEFAULT_SEGMENT_SIZE: u64 = 10 * 1024 * 1024;

/// Size of the length prefix framing each record on disk.
pub const LEN_PREFIX_SIZE: usize = 4;

/// On-disk entry format version understood by this build.
pub const FORMAT_VERSION: u8 = 1;
