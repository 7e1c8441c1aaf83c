//! # walkv-storage
//!
//! The durable key-value store layered on the segmented WAL.
//!
//! This crate provides:
//! - [`KeyValueStore`]: PUT/GET/DELETE over an in-memory map, every
//!   mutation logged and fsynced before it becomes visible
//! - Recovery from snapshot plus WAL tail replay
//! - Checkpoints: atomic snapshot, low-water mark advance, segment cleanup
//! - [`Compactor`]: a background task that deletes obsolete segments

pub mod compactor;
pub mod error;
pub mod snapshot;
pub mod store;

pub use compactor::{Compactor, DEFAULT_COMPACTION_INTERVAL};
pub use error::StoreError;
pub use snapshot::Snapshot;
pub use store::{KeyValueStore, StoreConfig};
