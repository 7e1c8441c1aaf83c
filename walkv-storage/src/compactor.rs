//! Background segment compactor.
//!
//! One task per store. Each iteration takes the store lock (inside
//! [`KeyValueStore::compact`]), deletes whatever the latest snapshot
//! covers, and sleeps for the configured interval. Shutdown is
//! cooperative: a flag plus a wakeup, so stopping does not have to wait
//! out the sleep.

use crate::store::KeyValueStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Default interval between compaction passes.
pub const DEFAULT_COMPACTION_INTERVAL: Duration = Duration::from_secs(60);

/// Owns the periodic compaction loop for one store.
pub struct Compactor {
    store: Arc<KeyValueStore>,
    interval: Duration,
    shutdown: AtomicBool,
    notify: Notify,
}

impl Compactor {
    /// Creates a compactor; call [`Compactor::run`] from a spawned task.
    pub fn new(store: Arc<KeyValueStore>, interval: Duration) -> Self {
        Self {
            store,
            interval,
            shutdown: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Runs the compaction loop until [`Compactor::shutdown`] is called.
    pub async fn run(&self) {
        tracing::info!(
            "compactor started (interval={}s)",
            self.interval.as_secs()
        );

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.store.compact() {
                Ok(0) => {}
                Ok(deleted) => {
                    tracing::info!("compaction pass deleted {} segment(s)", deleted);
                }
                Err(e) => {
                    tracing::warn!("compaction pass failed: {}", e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.notify.notified() => {}
            }
        }

        tracing::info!("compactor stopped");
    }

    /// Signals the loop to exit; safe to call from any thread.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.notify.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_shutdown_interrupts_sleep() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(KeyValueStore::open(StoreConfig::new(dir.path())).unwrap());
        let compactor = Arc::new(Compactor::new(store, Duration::from_secs(3600)));

        let handle = {
            let compactor = compactor.clone();
            tokio::spawn(async move { compactor.run().await })
        };

        compactor.shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("compactor did not stop promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn test_periodic_pass_runs_against_store() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(KeyValueStore::open(StoreConfig::new(dir.path())).unwrap());
        store.put("a", json!(1)).unwrap();
        store.checkpoint().unwrap();

        let compactor = Arc::new(Compactor::new(store.clone(), Duration::from_millis(10)));
        let handle = {
            let compactor = compactor.clone();
            tokio::spawn(async move { compactor.run().await })
        };

        // Let a few passes happen; the store stays intact throughout.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.get("a"), Some(json!(1)));

        compactor.shutdown();
        handle.await.unwrap();
    }
}
