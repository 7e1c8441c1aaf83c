//! Record codec: entry JSON plus the compression envelope.
//!
//! On-disk payload layout (inside the segment's length-prefixed frame):
//!
//! ```text
//! +----------+------------------------------+
//! | algo     | body                         |
//! | 1 byte   | raw or zlib-compressed JSON  |
//! +----------+------------------------------+
//! ```
//!
//! Keeping the envelope inside the frame makes compression record-local:
//! a directory can mix raw and compressed records, and changing the
//! configured algorithm never requires rewriting old segments.

use crate::entry::LogEntry;
use crate::error::WalError;
use bytes::{BufMut, Bytes, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Compression algorithm byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    None = 0,
    #[default]
    Zlib = 1,
}

impl TryFrom<u8> for CompressionType {
    type Error = WalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Zlib),
            _ => Err(WalError::UnknownCompression(value)),
        }
    }
}

/// Compression settings for newly written records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Algorithm applied to record bodies.
    #[serde(alias = "type")]
    pub algorithm: CompressionType,
    /// zlib level, 0-9.
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            algorithm: CompressionType::Zlib,
            level: 6,
        }
    }
}

impl CompressionConfig {
    pub fn none() -> Self {
        Self {
            algorithm: CompressionType::None,
            level: 0,
        }
    }

    pub fn zlib(level: u32) -> Self {
        Self {
            algorithm: CompressionType::Zlib,
            level: level.min(9),
        }
    }
}

/// Translates entries to and from enveloped payload bytes.
#[derive(Debug, Clone, Default)]
pub struct RecordCodec {
    config: CompressionConfig,
}

impl RecordCodec {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }

    /// Serializes and envelopes an entry.
    pub fn encode(&self, entry: &LogEntry) -> Result<Bytes, WalError> {
        let body = serde_json::to_vec(entry)?;

        let mut buf = BytesMut::with_capacity(body.len() + 1);
        match self.config.algorithm {
            CompressionType::None => {
                buf.put_u8(CompressionType::None as u8);
                buf.put_slice(&body);
            }
            CompressionType::Zlib => {
                let mut encoder =
                    ZlibEncoder::new(Vec::new(), Compression::new(self.config.level.min(9)));
                encoder.write_all(&body)?;
                let compressed = encoder.finish()?;
                buf.put_u8(CompressionType::Zlib as u8);
                buf.put_slice(&compressed);
            }
        }

        Ok(buf.freeze())
    }

    /// Unwraps the envelope, parses the body, and verifies the checksum.
    pub fn decode(&self, payload: &[u8]) -> Result<LogEntry, WalError> {
        let (&algo, body) = payload
            .split_first()
            .ok_or_else(|| WalError::Format("empty record payload".to_string()))?;

        let json = match CompressionType::try_from(algo)? {
            CompressionType::None => body.to_vec(),
            CompressionType::Zlib => {
                let mut decoder = ZlibDecoder::new(body);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| WalError::Format(format!("zlib decompression failed: {}", e)))?;
                out
            }
        };

        let entry: LogEntry = serde_json::from_slice(&json)
            .map_err(|e| WalError::Format(format!("invalid entry JSON: {}", e)))?;
        entry.verify()?;

        Ok(entry)
    }
}
