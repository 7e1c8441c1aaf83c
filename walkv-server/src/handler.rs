//! Command dispatch.

use std::sync::Arc;
use walkv_protocol::{Command, Reply};
use walkv_storage::KeyValueStore;

/// Maps wire commands onto store operations.
///
/// The store's "not found" results (a `None` GET, a `false` DELETE) become
/// ERROR replies here; on the wire, missing keys are reported, not silent.
pub struct CommandHandler {
    store: Arc<KeyValueStore>,
}

impl CommandHandler {
    pub fn new(store: Arc<KeyValueStore>) -> Self {
        Self { store }
    }

    /// Executes one command and produces its reply. Never fails: store
    /// errors are folded into ERROR replies for the client.
    pub fn dispatch(&self, command: Command) -> Reply {
        match command {
            Command::Get { key } => match self.store.get(&key) {
                Some(value) => Reply::value(value),
                None => Reply::error(format!("key not found: {}", key)),
            },
            Command::Put { key, value } => match self.store.put(key, value) {
                Ok(()) => Reply::ok(),
                Err(e) => Reply::error(e.to_string()),
            },
            Command::Delete { key } => match self.store.delete(&key) {
                Ok(true) => Reply::ok(),
                Ok(false) => Reply::error(format!("key not found: {}", key)),
                Err(e) => Reply::error(e.to_string()),
            },
            Command::Keys => Reply::keys(self.store.keys()),
            Command::Checkpoint => match self.store.checkpoint() {
                Ok(_) => Reply::ok(),
                Err(e) => Reply::error(e.to_string()),
            },
            Command::Quit => Reply::ok_with_message("goodbye"),
        }
    }
}
