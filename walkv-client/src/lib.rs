//! # walkv-client
//!
//! Async client for the walkv command protocol.

pub mod client;
pub mod connection;
pub mod error;

pub use client::Client;
pub use connection::Connection;
pub use error::ClientError;
