//! JSON message types for commands and replies.
//!
//! Requests carry a `"command"` discriminant, replies a `"status"`:
//!
//! ```text
//! -> {"command": "PUT", "key": "a", "value": 1}
//! <- {"status": "OK"}
//! -> {"command": "GET", "key": "a"}
//! <- {"status": "RESULT", "value": 1}
//! -> {"command": "GET", "key": "missing"}
//! <- {"status": "ERROR", "message": "key not found: missing"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A client command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "UPPERCASE")]
pub enum Command {
    Get { key: String },
    Put { key: String, value: Value },
    Delete { key: String },
    Keys,
    Checkpoint,
    Quit,
}

impl Command {
    /// The wire name of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get { .. } => "GET",
            Command::Put { .. } => "PUT",
            Command::Delete { .. } => "DELETE",
            Command::Keys => "KEYS",
            Command::Checkpoint => "CHECKPOINT",
            Command::Quit => "QUIT",
        }
    }
}

/// A server reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum Reply {
    Ok {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Result {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        keys: Option<Vec<String>>,
    },
    Error {
        message: String,
    },
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Ok { message: None }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Reply::Ok {
            message: Some(message.into()),
        }
    }

    pub fn value(value: Value) -> Self {
        Reply::Result {
            value: Some(value),
            keys: None,
        }
    }

    pub fn keys(keys: Vec<String>) -> Self {
        Reply::Result {
            value: None,
            keys: Some(keys),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error { .. })
    }
}
