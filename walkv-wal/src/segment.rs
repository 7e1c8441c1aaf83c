//! WAL segment files.
//!
//! A segment is one `<seq>.log` file holding length-prefixed record
//! payloads:
//!
//! ```text
//! +------------+---------------+------------+---------------+ ...
//! | len (4 BE) | payload       | len (4 BE) | payload       |
//! +------------+---------------+------------+---------------+ ...
//! ```
//!
//! There is no file header. A short read of either a length prefix or a
//! payload is a torn tail: everything before it is intact, everything from
//! it on is discarded by recovery.

use crate::error::WalError;
use crate::LEN_PREFIX_SIZE;
use bytes::{BufMut, Bytes, BytesMut};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Segment file name for a sequence number: `<seq>.log`.
pub fn segment_filename(seq: u64) -> String {
    format!("{}.log", seq)
}

/// Parses a sequence number out of a segment file name.
pub fn parse_segment_filename(name: &str) -> Option<u64> {
    name.strip_suffix(".log")?.parse().ok()
}

/// Contents of one segment, as read from disk.
#[derive(Debug)]
pub struct SegmentContents {
    /// Complete record payloads, in file order.
    pub payloads: Vec<Bytes>,
    /// Byte offset of the first torn byte (equals file length when clean).
    pub clean_len: u64,
    /// Whether the file ended mid-record.
    pub torn: bool,
}

/// Reads every complete record payload from a segment file.
///
/// A truncated final record is reported via [`SegmentContents::torn`], not
/// as an error; the caller decides whether a torn tail is tolerable.
pub fn read_segment(path: &Path) -> Result<SegmentContents, WalError> {
    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    let mut payloads = Vec::new();
    let mut offset = 0usize;

    loop {
        if offset == data.len() {
            return Ok(SegmentContents {
                payloads,
                clean_len: offset as u64,
                torn: false,
            });
        }
        if data.len() - offset < LEN_PREFIX_SIZE {
            break;
        }

        let len = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;

        let body_start = offset + LEN_PREFIX_SIZE;
        if data.len() - body_start < len {
            break;
        }

        payloads.push(Bytes::copy_from_slice(&data[body_start..body_start + len]));
        offset = body_start + len;
    }

    Ok(SegmentContents {
        payloads,
        clean_len: offset as u64,
        torn: true,
    })
}

/// Append handle for the active segment.
pub struct SegmentWriter {
    seq: u64,
    path: PathBuf,
    file: File,
    len: u64,
}

impl SegmentWriter {
    /// Opens (creating if absent) the segment for `seq` in append mode.
    pub fn open(dir: &Path, seq: u64) -> Result<Self, WalError> {
        let path = dir.join(segment_filename(seq));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            seq,
            path,
            file,
            len,
        })
    }

    /// Returns the sequence number in the segment's file name.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns the segment file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current file length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Writes one length-prefixed record and forces it to disk.
    pub fn append(&mut self, payload: &[u8]) -> Result<(), WalError> {
        let mut frame = BytesMut::with_capacity(LEN_PREFIX_SIZE + payload.len());
        frame.put_u32(payload.len() as u32);
        frame.put_slice(payload);

        self.file.write_all(&frame)?;
        self.file.flush()?;
        self.file.sync_data()?;
        self.len += frame.len() as u64;

        Ok(())
    }

    /// Discards everything from `offset` on (torn-tail repair).
    pub fn truncate_to(&mut self, offset: u64) -> Result<(), WalError> {
        self.file.set_len(offset)?;
        self.file.seek(SeekFrom::End(0))?;
        self.file.sync_data()?;
        self.len = offset;
        Ok(())
    }

    /// Flushes and fsyncs without appending.
    pub fn sync(&mut self) -> Result<(), WalError> {
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(())
    }
}

/// Segment directory scanner.
pub struct SegmentScanner;

impl SegmentScanner {
    /// Lists segment sequence numbers in a directory, sorted ascending.
    pub fn list(dir: &Path) -> Result<Vec<u64>, WalError> {
        let mut seqs = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(seq) = parse_segment_filename(&name.to_string_lossy()) {
                seqs.push(seq);
            }
        }

        seqs.sort_unstable();
        Ok(seqs)
    }
}
