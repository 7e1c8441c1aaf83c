//! Segmented write-ahead log.
//!
//! The WAL owns a directory of `<seq>.log` segments. Sequence numbers are
//! assigned at append time and only ever grow; rotation consumes one as
//! well, so file names track record numbering approximately. What replay
//! and compaction rely on is that file-name order equals record order.
//!
//! The WAL is not internally synchronized. The owning store serializes all
//! access through its own lock; construction and replay happen before any
//! concurrent use.

use crate::codec::{CompressionConfig, RecordCodec};
use crate::entry::{LogEntry, OpType};
use crate::error::WalError;
use crate::segment::{self, read_segment, SegmentScanner, SegmentWriter};
use crate::DEFAULT_SEGMENT_SIZE;
use serde_json::Value;
use std::path::PathBuf;

/// WAL configuration.
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// Directory holding the segment files.
    pub dir: PathBuf,
    /// File size threshold that triggers rotation after an append.
    pub segment_size: u64,
    /// Compression applied to new records.
    pub compression: CompressionConfig,
}

impl WalConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
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
}

/// Segmented write-ahead log.
pub struct Wal {
    config: WalConfig,
    codec: RecordCodec,
    active: Option<SegmentWriter>,
    seq_num: u64,
}

impl Wal {
    /// Opens or creates a WAL at the configured directory.
    ///
    /// The sequence counter resumes from the highest segment file name;
    /// a torn tail in the active segment is truncated so appends continue
    /// after the last complete record.
    pub fn open(config: WalConfig) -> Result<Self, WalError> {
        std::fs::create_dir_all(&config.dir)?;

        let seqs = SegmentScanner::list(&config.dir)?;
        let seq_num = seqs.last().copied().unwrap_or(0);

        let mut active = SegmentWriter::open(&config.dir, seq_num)?;
        let contents = read_segment(active.path())?;
        if contents.torn {
            tracing::warn!(
                "truncating torn tail of segment {} at offset {} (removed {} bytes)",
                seq_num,
                contents.clean_len,
                active.len() - contents.clean_len
            );
            active.truncate_to(contents.clean_len)?;
        }

        tracing::info!(
            "WAL opened: {} segment(s), seq_num={}",
            seqs.len().max(1),
            seq_num
        );

        Ok(Self {
            codec: RecordCodec::new(config.compression),
            config,
            active: Some(active),
            seq_num,
        })
    }

    /// Returns the last assigned sequence number (0 before any append).
    pub fn seq_num(&self) -> u64 {
        self.seq_num
    }

    /// Raises the sequence counter to `seq` if it is behind.
    ///
    /// Recovery calls this with the highest sequence number seen in the
    /// snapshot and the replayed tail; file names alone under-count when
    /// the active segment holds records past its own name.
    pub fn advance_seq_to(&mut self, seq: u64) {
        if seq > self.seq_num {
            self.seq_num = seq;
        }
    }

    /// Returns the WAL directory.
    pub fn dir(&self) -> &std::path::Path {
        &self.config.dir
    }

    /// Appends one operation, fsyncs it, and returns its sequence number.
    pub fn append(
        &mut self,
        op_type: OpType,
        key: impl Into<String>,
        value: Option<Value>,
    ) -> Result<u64, WalError> {
        let active = self.active.as_mut().ok_or(WalError::Closed)?;

        self.seq_num += 1;
        let seq = self.seq_num;

        let entry = LogEntry::new(seq, op_type, key, value);
        let payload = self.codec.encode(&entry)?;
        active.append(&payload)?;

        if active.len() > self.config.segment_size {
            self.rotate()?;
        }

        Ok(seq)
    }

    /// Closes the full segment and starts the next one.
    fn rotate(&mut self) -> Result<(), WalError> {
        if let Some(mut old) = self.active.take() {
            old.sync()?;
        }
        self.seq_num += 1;
        self.active = Some(SegmentWriter::open(&self.config.dir, self.seq_num)?);
        tracing::debug!("rotated to segment {}", self.seq_num);
        Ok(())
    }

    /// Replays every record in the directory, in sequence order.
    ///
    /// A torn tail is tolerated in the final segment only; anywhere else
    /// it means a segment was corrupted after being superseded, which is
    /// surfaced as [`WalError::TornSegment`]. Checksum and format errors
    /// always fail the replay.
    pub fn read_all(&self) -> Result<Vec<LogEntry>, WalError> {
        let seqs = SegmentScanner::list(&self.config.dir)?;
        let mut entries = Vec::new();

        for (i, &seq) in seqs.iter().enumerate() {
            let path = self.config.dir.join(segment::segment_filename(seq));
            let contents = read_segment(&path)?;

            if contents.torn {
                if i + 1 != seqs.len() {
                    return Err(WalError::TornSegment {
                        segment: seq,
                        offset: contents.clean_len,
                    });
                }
                tracing::debug!(
                    "ignoring torn tail of final segment {} at offset {}",
                    seq,
                    contents.clean_len
                );
            }

            for payload in &contents.payloads {
                entries.push(self.codec.decode(payload)?);
            }
        }

        Ok(entries)
    }

    /// Deletes every segment whose file name is below `low_water_mark`,
    /// provided the snapshot is fresh. Returns the number deleted.
    ///
    /// Freshness means `snapshot_seq_num` equals the current sequence
    /// number: nothing has been appended since the snapshot was taken, so
    /// everything below the mark is covered by it. A stale snapshot makes
    /// this a no-op; deleting anyway would drop uncheckpointed records.
    pub fn delete_old_segments(
        &mut self,
        low_water_mark: u64,
        snapshot_seq_num: u64,
    ) -> Result<usize, WalError> {
        if snapshot_seq_num != self.seq_num {
            tracing::debug!(
                "snapshot seq {} behind WAL seq {}; skipping segment cleanup",
                snapshot_seq_num,
                self.seq_num
            );
            return Ok(0);
        }

        let mut deleted = 0;
        for seq in SegmentScanner::list(&self.config.dir)? {
            if seq < low_water_mark {
                std::fs::remove_file(self.config.dir.join(segment::segment_filename(seq)))?;
                tracing::info!("deleted WAL segment {}", seq);
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    /// Closes the active segment handle without opening a new one.
    ///
    /// Part of the checkpoint sequence: the store closes the segment,
    /// deletes obsolete ones, then calls [`Wal::start_new_segment`].
    pub fn close_active_segment(&mut self) -> Result<(), WalError> {
        if let Some(mut active) = self.active.take() {
            active.sync()?;
        }
        Ok(())
    }

    /// Opens a fresh active segment named after the current sequence number.
    pub fn start_new_segment(&mut self) -> Result<(), WalError> {
        self.active = Some(SegmentWriter::open(&self.config.dir, self.seq_num)?);
        Ok(())
    }

    /// Flushes and closes the WAL. Further appends fail with
    /// [`WalError::Closed`].
    pub fn close(&mut self) -> Result<(), WalError> {
        self.close_active_segment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn test_config(dir: &Path) -> WalConfig {
        WalConfig::new(dir)
    }

    #[test]
    fn test_empty_directory_starts_at_zero() {
        let dir = TempDir::new().unwrap();
        let wal = Wal::open(test_config(dir.path())).unwrap();
        assert_eq!(wal.seq_num(), 0);
        assert!(wal.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_assigns_increasing_seqs() {
        let dir = TempDir::new().unwrap();
        let mut wal = Wal::open(test_config(dir.path())).unwrap();

        assert_eq!(wal.append(OpType::Put, "a", Some(json!(1))).unwrap(), 1);
        assert_eq!(wal.append(OpType::Put, "b", Some(json!(2))).unwrap(), 2);
        assert_eq!(wal.append(OpType::Delete, "a", None).unwrap(), 3);

        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].key, "a");
        assert_eq!(entries[2].op_type, OpType::Delete);
        for pair in entries.windows(2) {
            assert!(pair[0].seq_num < pair[1].seq_num);
        }
    }

    #[test]
    fn test_rotation_creates_multiple_segments() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_segment_size(10);
        let mut wal = Wal::open(config).unwrap();

        wal.append(OpType::Put, "k1", Some(json!("v1"))).unwrap();
        wal.append(OpType::Put, "k2", Some(json!("v2"))).unwrap();
        wal.append(OpType::Put, "k3", Some(json!("v3"))).unwrap();

        let seqs = SegmentScanner::list(dir.path()).unwrap();
        assert!(seqs.len() >= 2, "expected rotation, got {:?}", seqs);

        let entries = wal.read_all().unwrap();
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["k1", "k2", "k3"]);
    }

    #[test]
    fn test_reopen_resumes_from_filenames() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_segment_size(10);
        {
            let mut wal = Wal::open(config.clone()).unwrap();
            for i in 0..4 {
                wal.append(OpType::Put, format!("k{}", i), Some(json!(i)))
                    .unwrap();
            }
            wal.close().unwrap();
        }

        let mut wal = Wal::open(config).unwrap();
        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 4);

        // With these segment sizes every append rotates, so the counter
        // restored from file names is already past every record and new
        // appends stay strictly monotone.
        let max_seq = entries.iter().map(|e| e.seq_num).max().unwrap();
        let next = wal.append(OpType::Put, "k4", Some(json!(4))).unwrap();
        assert!(next > max_seq);
    }

    #[test]
    fn test_advance_seq_only_moves_forward() {
        let dir = TempDir::new().unwrap();
        let mut wal = Wal::open(test_config(dir.path())).unwrap();

        wal.advance_seq_to(9);
        assert_eq!(wal.seq_num(), 9);
        wal.advance_seq_to(4);
        assert_eq!(wal.seq_num(), 9);

        assert_eq!(wal.append(OpType::Put, "k", Some(json!(0))).unwrap(), 10);
    }

    #[test]
    fn test_torn_tail_of_final_segment_tolerated() {
        let dir = TempDir::new().unwrap();
        {
            let mut wal = Wal::open(test_config(dir.path())).unwrap();
            wal.append(OpType::Put, "a", Some(json!(1))).unwrap();
            wal.append(OpType::Put, "b", Some(json!(2))).unwrap();
            wal.close().unwrap();
        }

        // Chop bytes off the only segment's tail.
        let path = dir.path().join("0.log");
        let len = std::fs::metadata(&path).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 3).unwrap();

        let wal = Wal::open(test_config(dir.path())).unwrap();
        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "a");
    }

    #[test]
    fn test_open_repairs_torn_tail_and_resumes() {
        let dir = TempDir::new().unwrap();
        {
            let mut wal = Wal::open(test_config(dir.path())).unwrap();
            wal.append(OpType::Put, "a", Some(json!(1))).unwrap();
            wal.close().unwrap();
        }

        // Simulate a crash mid-append: garbage after the last record.
        {
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(dir.path().join("0.log"))
                .unwrap();
            file.write_all(&[0x00, 0x00, 0x01]).unwrap();
        }

        let mut wal = Wal::open(test_config(dir.path())).unwrap();
        wal.append(OpType::Put, "b", Some(json!(2))).unwrap();

        let keys: Vec<_> = wal
            .read_all()
            .unwrap()
            .into_iter()
            .map(|e| e.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_torn_record_in_earlier_segment_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_segment_size(10);
        {
            let mut wal = Wal::open(config.clone()).unwrap();
            wal.append(OpType::Put, "k1", Some(json!("v1"))).unwrap();
            wal.append(OpType::Put, "k2", Some(json!("v2"))).unwrap();
            wal.close().unwrap();
        }

        let seqs = SegmentScanner::list(dir.path()).unwrap();
        assert!(seqs.len() >= 2);
        let first = dir.path().join(segment::segment_filename(seqs[0]));
        let len = std::fs::metadata(&first).unwrap().len();
        let file = std::fs::OpenOptions::new().write(true).open(&first).unwrap();
        file.set_len(len - 1).unwrap();

        let wal = Wal::open(config).unwrap();
        let result = wal.read_all();
        assert!(matches!(result, Err(WalError::TornSegment { .. })));
    }

    #[test]
    fn test_flipped_byte_fails_replay() {
        let dir = TempDir::new().unwrap();
        {
            let mut wal = Wal::open(test_config(dir.path())).unwrap();
            wal.append(OpType::Put, "k", Some(json!("v"))).unwrap();
            wal.close().unwrap();
        }

        let path = dir.path().join("0.log");
        let mut bytes = std::fs::read(&path).unwrap();
        // Flip a byte inside the payload, past the length prefix and the
        // compression envelope byte.
        let idx = bytes.len() - 2;
        bytes[idx] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let wal = Wal::open(test_config(dir.path())).unwrap();
        let result = wal.read_all();
        assert!(result.is_err());
        assert!(result.err().unwrap().is_corruption());
    }

    #[test]
    fn test_stale_snapshot_blocks_deletion() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_segment_size(10);
        let mut wal = Wal::open(config).unwrap();

        for i in 0..5 {
            wal.append(OpType::Put, format!("k{}", i), Some(json!(i)))
                .unwrap();
        }
        let before = SegmentScanner::list(dir.path()).unwrap().len();

        // Snapshot taken three appends ago: not fresh.
        let deleted = wal.delete_old_segments(wal.seq_num(), wal.seq_num() - 3).unwrap();
        assert_eq!(deleted, 0);
        assert_eq!(SegmentScanner::list(dir.path()).unwrap().len(), before);
    }

    #[test]
    fn test_fresh_snapshot_deletes_below_mark() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_segment_size(10);
        let mut wal = Wal::open(config).unwrap();

        for i in 0..5 {
            wal.append(OpType::Put, format!("k{}", i), Some(json!(i)))
                .unwrap();
        }
        let lwm = wal.seq_num();

        wal.close_active_segment().unwrap();
        let deleted = wal.delete_old_segments(lwm, lwm).unwrap();
        wal.start_new_segment().unwrap();

        assert!(deleted >= 1);
        for seq in SegmentScanner::list(dir.path()).unwrap() {
            assert!(seq >= lwm);
        }
    }

    #[test]
    fn test_read_all_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let config = test_config(dir.path()).with_segment_size(64);
        let mut wal = Wal::open(config).unwrap();

        for i in 0..10 {
            wal.append(OpType::Put, format!("k{}", i), Some(json!(i)))
                .unwrap();
        }

        let first = wal.read_all().unwrap();
        let second = wal.read_all().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_append_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let mut wal = Wal::open(test_config(dir.path())).unwrap();
        wal.close().unwrap();

        let result = wal.append(OpType::Put, "k", Some(json!(1)));
        assert!(matches!(result, Err(WalError::Closed)));
    }
}
