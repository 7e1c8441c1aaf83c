//! # walkv-server
//!
//! TCP front-end for the walkv store: configuration loading, the command
//! dispatcher, and the connection-handling server loop.

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use config::{CompactionConfig, Config, ConfigError, NetworkConfig, StorageConfig};
pub use error::ServerError;
pub use handler::CommandHandler;
pub use server::Server;
