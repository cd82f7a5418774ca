//! Background Expiration Task
//!
//! Periodically scans and removes expired keys from the store. This
//! complements lazy expiration (checking on read) by purging entries that
//! are never touched again. The sweep uses compare-and-remove, so a SET
//! that races the scan with a fresh deadline is left alone, and it never
//! writes to the append-only log: expirations are reconstructed on replay
//! from each entry's absolute deadline.

use super::Store;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

/// Configuration for the background expiration task
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Interval between sweep runs (default: 1 second)
    pub interval: Duration,
    /// Whether to spawn the background task (default: true)
    pub enabled: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            enabled: true,
        }
    }
}

/// Handle for controlling the background expiration task
pub struct Sweeper {
    /// Signal to stop the task
    shutdown: Arc<AtomicBool>,
    /// Notify handle to wake up the task early
    notify: Arc<Notify>,
    /// Join handle for the background task
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn a new background expiration task
    pub fn spawn(store: Store, config: SweeperConfig) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());

        let shutdown_clone = shutdown.clone();
        let notify_clone = notify.clone();

        let handle = if config.enabled {
            Some(tokio::spawn(async move {
                run_sweep_loop(store, config, shutdown_clone, notify_clone).await;
            }))
        } else {
            None
        };

        Self {
            shutdown,
            notify,
            handle,
        }
    }

    /// Signal the task to shut down gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Wait for the task to complete
    pub async fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Trigger an immediate sweep cycle
    pub fn trigger(&self) {
        self.notify.notify_one();
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }
}

/// Main loop for the background expiration task
async fn run_sweep_loop(
    store: Store,
    config: SweeperConfig,
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
) {
    info!(interval = ?config.interval, "starting background expiration task");

    loop {
        // Wait for the sweep interval or an early wake-up
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = notify.notified() => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
            }
        }

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let purged = store.purge_expired();
        if purged > 0 {
            debug!(purged, "background expiration removed keys");
        }
    }

    info!("background expiration task stopped");
}
