//! Log entry types.
//!
//! An entry is serialized as a JSON object:
//!
//! ```text
//! {
//!   "seq_num": 7,
//!   "op_type": 1,            // 1 = PUT, 2 = DELETE
//!   "key": "user:42",
//!   "value": {...},          // absent for DELETE
//!   "timestamp": 1712345678, // wall-clock seconds, informational
//!   "checksum": 2868347032,  // CRC-32 (IEEE) of the canonical text
//!   "format_version": 1
//! }
//! ```
//!
//! The checksum covers the UTF-8 concatenation of the decimal sequence
//! number, the numeric operation type, the key, the canonical JSON text of
//! the value (the literal `null` when absent), and the decimal timestamp.
//! It is recomputed on every decode; a mismatch fails that record.

use crate::error::WalError;
use crate::FORMAT_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of logged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OpType {
    Put = 1,
    Delete = 2,
}

impl From<OpType> for u8 {
    fn from(op: OpType) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for OpType {
    type Error = WalError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OpType::Put),
            2 => Ok(OpType::Delete),
            _ => Err(WalError::Format(format!("unknown op_type: {}", value))),
        }
    }
}

/// One durable operation in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq_num: u64,
    pub op_type: OpType,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub timestamp: i64,
    pub checksum: u32,
    pub format_version: u8,
}

impl LogEntry {
    /// Creates an entry stamped with the current wall-clock time and a
    /// freshly computed checksum.
    pub fn new(seq_num: u64, op_type: OpType, key: impl Into<String>, value: Option<Value>) -> Self {
        let key = key.into();
        let timestamp = chrono::Utc::now().timestamp();
        let checksum = compute_checksum(seq_num, op_type, &key, value.as_ref(), timestamp);
        Self {
            seq_num,
            op_type,
            key,
            value,
            timestamp,
            checksum,
            format_version: FORMAT_VERSION,
        }
    }

    /// Recomputes the checksum from the entry's fields.
    pub fn computed_checksum(&self) -> u32 {
        compute_checksum(
            self.seq_num,
            self.op_type,
            &self.key,
            self.value.as_ref(),
            self.timestamp,
        )
    }

    /// Validates the format version and stored checksum.
    pub fn verify(&self) -> Result<(), WalError> {
        if self.format_version != FORMAT_VERSION {
            return Err(WalError::UnsupportedVersion(self.format_version));
        }
        let computed = self.computed_checksum();
        if computed != self.checksum {
            return Err(WalError::Checksum {
                seq_num: self.seq_num,
                stored: self.checksum,
                computed,
            });
        }
        Ok(())
    }
}

/// CRC-32 (IEEE) over the fixed textual rendering of the entry's fields.
fn compute_checksum(
    seq_num: u64,
    op_type: OpType,
    key: &str,
    value: Option<&Value>,
    timestamp: i64,
) -> u32 {
    let value_text = match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    };
    let input = format!(
        "{}{}{}{}{}",
        seq_num,
        u8::from(op_type),
        key,
        value_text,
        timestamp
    );

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(input.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_checksum_verifies_after_roundtrip() {
        let entry = LogEntry::new(7, OpType::Put, "user:42", Some(json!({"name": "ada"})));
        let bytes = serde_json::to_vec(&entry).unwrap();
        let parsed: LogEntry = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(parsed, entry);
        parsed.verify().unwrap();
    }

    #[test]
    fn test_tampered_value_fails_verification() {
        let mut entry = LogEntry::new(1, OpType::Put, "k", Some(json!("v")));
        entry.value = Some(json!("tampered"));

        let err = entry.verify().unwrap_err();
        assert!(matches!(err, WalError::Checksum { seq_num: 1, .. }));
    }

    #[test]
    fn test_tampered_key_fails_verification() {
        let mut entry = LogEntry::new(3, OpType::Delete, "k", None);
        entry.key = "other".to_string();

        assert!(matches!(entry.verify(), Err(WalError::Checksum { .. })));
    }

    #[test]
    fn test_delete_entry_has_no_value() {
        let entry = LogEntry::new(2, OpType::Delete, "gone", None);
        let json = serde_json::to_string(&entry).unwrap();

        assert!(!json.contains("\"value\""));
        entry.verify().unwrap();
    }

    #[test]
    fn test_op_type_numeric_encoding() {
        let entry = LogEntry::new(1, OpType::Put, "k", Some(json!(1)));
        let json: Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["op_type"], json!(1));

        let entry = LogEntry::new(2, OpType::Delete, "k", None);
        let json: Value = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["op_type"], json!(2));
    }

    #[test]
    fn test_unknown_op_type_rejected() {
        let raw = json!({
            "seq_num": 1,
            "op_type": 9,
            "key": "k",
            "timestamp": 0,
            "checksum": 0,
            "format_version": 1
        });
        let result: Result<LogEntry, _> = serde_json::from_value(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_unsupported_format_version_rejected() {
        let mut entry = LogEntry::new(1, OpType::Put, "k", Some(json!(true)));
        entry.format_version = 2;

        assert!(matches!(
            entry.verify(),
            Err(WalError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_checksum_distinguishes_none_from_null_text_collision() {
        // An absent value and an explicit JSON null hash identically by
        // design: both render as the text "null".
        let a = LogEntry::new(5, OpType::Put, "k", Some(Value::Null));
        let b = LogEntry {
            value: None,
            ..a.clone()
        };
        assert_eq!(a.computed_checksum(), b.computed_checksum());
    }

    #[test]
    fn test_nested_values_roundtrip() {
        let value = json!({
            "nested": {"list": [1, 2.5, "three", null, true]},
            "count": 0
        });
        let entry = LogEntry::new(11, OpType::Put, "doc", Some(value));
        let parsed: LogEntry =
            serde_json::from_slice(&serde_json::to_vec(&entry).unwrap()).unwrap();
        parsed.verify().unwrap();
        assert_eq!(parsed.value, entry.value);
    }
}
