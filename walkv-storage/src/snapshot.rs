//! Snapshot persistence.
//!
//! A snapshot is the whole in-memory map plus the WAL sequence number it
//! was taken at, serialized to `<data_dir>/snapshot.json`. It is written
//! to a temp file, fsynced, then renamed over the previous snapshot, so
//! readers never observe a torn file. Absent before the first checkpoint.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Snapshot file name within the data directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// A point-in-time dump of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// WAL sequence number at the moment the snapshot was taken.
    pub seq_num: u64,
    /// The full key-value mapping.
    pub data: HashMap<String, Value>,
}

/// Only the sequence field, for freshness checks that don't need the data.
#[derive(Debug, Deserialize)]
struct SnapshotHeader {
    seq_num: u64,
}

impl Snapshot {
    /// Path of the snapshot file under `dir`.
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(SNAPSHOT_FILE)
    }

    /// Loads the snapshot, or `None` if no checkpoint has happened yet.
    pub fn load(dir: &Path) -> Result<Option<Self>, StoreError> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let snapshot = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(snapshot))
    }

    /// Reads only the snapshot's sequence number.
    pub fn read_seq_num(dir: &Path) -> Result<Option<u64>, StoreError> {
        let path = Self::path(dir);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        let header: SnapshotHeader = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(header.seq_num))
    }

    /// Writes the snapshot via temp file + fsync + atomic rename.
    pub fn write(&self, dir: &Path) -> Result<(), StoreError> {
        let path = Self::path(dir);
        let tmp = dir.join(format!("{}.tmp", SNAPSHOT_FILE));

        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &path)?;

        tracing::info!(
            "wrote snapshot at seq {} ({} keys)",
            self.seq_num,
            self.data.len()
        );
        Ok(())
    }
}
