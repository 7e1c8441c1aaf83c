//! walkv - durable key-value store
//!
//! A TCP key-value server with WAL durability, snapshot checkpoints, and
//! background segment compaction.

use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use walkv_server::{Config, Server};
use walkv_storage::{Compactor, KeyValueStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration (from file if WALKV_CONFIG is set, then env overrides)
    let config = match Config::load() {
        Ok(c) => {
            if let Ok(path) = std::env::var("WALKV_CONFIG") {
                tracing::info!("Loaded config from {}", path);
            }
            c
        }
        Err(e) => {
            // If a config file was explicitly specified, fail on error
            if std::env::var("WALKV_CONFIG").is_ok() {
                tracing::error!("Failed to load config: {}", e);
                return Err(e.into());
            }
            tracing::info!("Using default configuration");
            Config::default()
        }
    };

    tracing::info!("Starting walkv server");
    tracing::info!("  Bind address: {}", config.network.bind_addr);
    tracing::info!("  Data directory: {}", config.storage.data_dir.display());
    tracing::info!("  Segment size: {} bytes", config.storage.segment_size);
    tracing::info!(
        "  Compression: {:?} (level {})",
        config.storage.compression.algorithm,
        config.storage.compression.level
    );
    tracing::info!(
        "  Compaction interval: {}s",
        config.compaction.interval_secs
    );

    // Open the store (recovers from snapshot + WAL)
    let store = Arc::new(KeyValueStore::open(config.storage.to_store_config())?);

    // Bind the server
    let server = Arc::new(Server::bind(config.network.bind_addr, store.clone()).await?);

    // Spawn the background compactor
    let compactor = Arc::new(Compactor::new(store.clone(), config.compaction.interval()));
    let compactor_handle = {
        let compactor = compactor.clone();
        tokio::spawn(async move {
            compactor.run().await;
        })
    };

    // Spawn shutdown signal handler
    let shutdown_server = server.clone();
    let shutdown_compactor = compactor.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal, stopping server...");
        shutdown_server.shutdown();
        shutdown_compactor.shutdown();
    });

    // Run server (blocks until shutdown)
    server.run().await?;

    // Wait for the compactor to stop
    let _ = compactor_handle.await;

    // Flush and close the store before exit
    if let Err(e) = store.close() {
        tracing::error!("Failed to close store on shutdown: {}", e);
    }

    tracing::info!("Server stopped");
    Ok(())
}
