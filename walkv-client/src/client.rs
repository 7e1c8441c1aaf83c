//! High-level client API.

use crate::connection::Connection;
use crate::error::ClientError;
use serde_json::Value;
use std::net::SocketAddr;
use tokio::sync::Mutex;
use walkv_protocol::{Command, Reply};

/// Typed client for walkv.
///
/// Missing keys come back from the server as ERROR replies; this wrapper
/// restores the store's own semantics, returning `None` from [`Client::get`]
/// and `false` from [`Client::delete`] instead of failing.
pub struct Client {
    conn: Mutex<Connection>,
}

impl Client {
    /// Connects to a walkv server.
    pub async fn connect(addr: SocketAddr) -> Result<Self, ClientError> {
        let conn = Connection::connect(addr).await?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    async fn request(&self, command: Command) -> Result<Reply, ClientError> {
        self.conn.lock().await.request(&command).await
    }

    /// Retrieves a value, or `None` if the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, ClientError> {
        let reply = self
            .request(Command::Get {
                key: key.to_string(),
            })
            .await?;

        match reply {
            Reply::Result { value, .. } => Ok(value),
            Reply::Error { message } if is_not_found(&message) => Ok(None),
            Reply::Error { message } => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }

    /// Stores a key-value pair.
    pub async fn put(&self, key: &str, value: Value) -> Result<(), ClientError> {
        let reply = self
            .request(Command::Put {
                key: key.to_string(),
                value,
            })
            .await?;

        match reply {
            Reply::Ok { .. } => Ok(()),
            Reply::Error { message } => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }

    /// Deletes a key. Returns whether it existed.
    pub async fn delete(&self, key: &str) -> Result<bool, ClientError> {
        let reply = self
            .request(Command::Delete {
                key: key.to_string(),
            })
            .await?;

        match reply {
            Reply::Ok { .. } => Ok(true),
            Reply::Error { message } if is_not_found(&message) => Ok(false),
            Reply::Error { message } => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }

    /// Lists all keys.
    pub async fn keys(&self) -> Result<Vec<String>, ClientError> {
        let reply = self.request(Command::Keys).await?;

        match reply {
            Reply::Result {
                keys: Some(keys), ..
            } => Ok(keys),
            Reply::Error { message } => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }

    /// Asks the server to take a checkpoint.
    pub async fn checkpoint(&self) -> Result<(), ClientError> {
        let reply = self.request(Command::Checkpoint).await?;

        match reply {
            Reply::Ok { .. } => Ok(()),
            Reply::Error { message } => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }

    /// Says goodbye; the server closes the connection afterwards.
    pub async fn quit(&self) -> Result<(), ClientError> {
        let reply = self.request(Command::Quit).await?;

        match reply {
            Reply::Ok { .. } => Ok(()),
            Reply::Error { message } => Err(ClientError::Server(message)),
            other => Err(unexpected(&other)),
        }
    }
}

fn is_not_found(message: &str) -> bool {
    message.starts_with("key not found")
}

fn unexpected(reply: &Reply) -> ClientError {
    ClientError::UnexpectedReply(format!("{:?}", reply))
}
