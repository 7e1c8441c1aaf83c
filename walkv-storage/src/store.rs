//! The durable key-value store.
//!
//! All mutable state (the map, the WAL, the low-water mark) lives behind a
//! single mutex. Public operations lock once and call straight through;
//! the checkpoint performs its whole snapshot-close-delete-reopen sequence
//! under that one lock, so the freshness check inside the WAL cannot race
//! with a concurrent write.

use crate::error::StoreError;
use crate::snapshot::Snapshot;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkv_wal::{CompressionConfig, OpType, Wal, WalConfig, DEFAULT_SEGMENT_SIZE};

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base directory: holds `snapshot.json` and the `wal/` subdirectory.
    pub data_dir: PathBuf,
    /// Segment rotation threshold in bytes.
    pub segment_size: u64,
    /// Compression for new WAL records.
    pub compression: CompressionConfig,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            segment_size: DEFAULT_SEGMENT_SIZE,
            compression: CompressionConfig::default(),
        }
    }

    pub fn with_segment_size(mut self, size: u64) -> Self {
        self.segment_size = size;
        self
    }

    pub fn with_compression(mut self, compression: CompressionConfig) -> Self {
        self.compression = compression;
        self
    }

    /// Directory holding the WAL segments.
    pub fn wal_dir(&self) -> PathBuf {
        self.data_dir.join("wal")
    }
}

struct StoreInner {
    wal: Wal,
    data: HashMap<String, Value>,
    low_water_mark: u64,
}

/// A durable in-memory key-value store backed by the segmented WAL.
pub struct KeyValueStore {
    data_dir: PathBuf,
    inner: Mutex<StoreInner>,
}

impl KeyValueStore {
    /// Opens the store, recovering state from the snapshot (if present)
    /// and the WAL tail.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.data_dir)?;

        let snapshot = Snapshot::load(&config.data_dir)?;
        let (mut data, snapshot_seq) = match snapshot {
            Some(s) => (s.data, s.seq_num),
            None => (HashMap::new(), 0),
        };

        let wal_config = WalConfig::new(config.wal_dir())
            .with_segment_size(config.segment_size)
            .with_compression(config.compression);
        let mut wal = Wal::open(wal_config)?;

        // Entries at or below the snapshot's sequence are already baked in.
        let mut max_seq = snapshot_seq;
        let mut replayed = 0usize;
        for entry in wal.read_all()? {
            if entry.seq_num <= snapshot_seq {
                continue;
            }
            match entry.op_type {
                OpType::Put => {
                    if let Some(value) = entry.value {
                        data.insert(entry.key, value);
                    }
                }
                OpType::Delete => {
                    data.remove(&entry.key);
                }
            }
            max_seq = max_seq.max(entry.seq_num);
            replayed += 1;
        }
        wal.advance_seq_to(max_seq);

        tracing::info!(
            "store recovered: {} key(s), seq={}, snapshot_seq={}, {} entr(ies) replayed",
            data.len(),
            wal.seq_num(),
            snapshot_seq,
            replayed
        );

        Ok(Self {
            data_dir: config.data_dir,
            inner: Mutex::new(StoreInner {
                wal,
                data,
                low_water_mark: snapshot_seq,
            }),
        })
    }

    /// Stores a key-value pair. The record is fsynced before the map is
    /// updated, so a value is never visible without being durable.
    pub fn put(&self, key: impl Into<String>, value: Value) -> Result<(), StoreError> {
        let key = key.into();
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut inner = self.inner.lock();
        inner
            .wal
            .append(OpType::Put, key.as_str(), Some(value.clone()))?;
        inner.data.insert(key, value);
        Ok(())
    }

    /// Retrieves a value. Purely in-memory; never touches the WAL.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().data.get(key).cloned()
    }

    /// Deletes a key. Returns `false` (performing no I/O) if absent.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let mut inner = self.inner.lock();
        if !inner.data.contains_key(key) {
            return Ok(false);
        }
        inner.wal.append(OpType::Delete, key, None)?;
        inner.data.remove(key);
        Ok(true)
    }

    /// Returns the current key set, sorted.
    pub fn keys(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let mut keys: Vec<String> = inner.data.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.inner.lock().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().data.is_empty()
    }

    /// Sequence number below which all records are covered by the latest
    /// checkpoint.
    pub fn low_water_mark(&self) -> u64 {
        self.inner.lock().low_water_mark
    }

    /// Takes a checkpoint: write the snapshot atomically, advance the
    /// low-water mark, drop segments the snapshot covers, and start a
    /// fresh segment. Returns the checkpointed sequence number.
    ///
    /// Live keys are deliberately not re-logged into the new segment: the
    /// snapshot is the base state, and the WAL only needs to carry
    /// mutations made after it.
    pub fn checkpoint(&self) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.seq_num();

        Snapshot {
            seq_num: seq,
            data: inner.data.clone(),
        }
        .write(&self.data_dir)?;

        inner.wal.close_active_segment()?;
        inner.low_water_mark = seq;

        // Freshness is checked against the file we just wrote; holding the
        // lock means no append can have advanced the WAL past it.
        let snapshot_seq = Snapshot::read_seq_num(&self.data_dir)?.unwrap_or(0);
        let deleted = inner.wal.delete_old_segments(seq, snapshot_seq)?;

        inner.wal.start_new_segment()?;

        tracing::info!(
            "checkpoint complete at seq {}, {} segment(s) deleted",
            seq,
            deleted
        );
        Ok(seq)
    }

    /// One compaction pass: delete segments below the low-water mark if
    /// the snapshot is still fresh. Returns the number of segments
    /// deleted. Called periodically by the background compactor.
    pub fn compact(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();

        let snapshot_seq = match Snapshot::read_seq_num(&self.data_dir)? {
            Some(seq) => seq,
            None => return Ok(0),
        };
        let low_water_mark = inner.low_water_mark;

        Ok(inner.wal.delete_old_segments(low_water_mark, snapshot_seq)?)
    }

    /// Flushes and closes the WAL.
    pub fn close(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.wal.close()?;
        Ok(())
    }

    /// Base data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
