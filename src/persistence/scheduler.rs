//! Periodic Snapshot Scheduler
//!
//! This module runs a background task that saves the datastore on a fixed
//! interval, independent of client activity.
//!
//! ## Design
//!
//! The scheduler runs as a Tokio task and:
//! 1. Waits for the next tick (the first tick is one full interval after start)
//! 2. Captures and writes a snapshot on the blocking thread pool
//! 3. Logs failures and keeps going
//!
//! ## Shutdown
//!
//! `stop` signals the task through a watch channel and then waits for it to
//! finish. A save that is already running completes first, so once `stop`
//! returns no periodic save can race with the final save at shutdown.

use crate::persistence::Gateway;
use crate::storage::Datastore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Default interval between periodic saves.
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// A handle to the running snapshot scheduler.
///
/// When this handle is dropped, the scheduler task is signalled to stop.
/// Use [`SnapshotScheduler::stop`] to also wait for it.
#[derive(Debug)]
pub struct SnapshotScheduler {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,

    /// The running task
    handle: Option<JoinHandle<()>>,
}

impl SnapshotScheduler {
    /// Starts saving `store` through `gateway` every `interval`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use vertexkv::persistence::{Gateway, SnapshotScheduler};
    /// use vertexkv::storage::Datastore;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let store = Arc::new(Datastore::new());
    /// let gateway = Gateway::new("data", store.limits());
    /// let scheduler = SnapshotScheduler::start(store, gateway, Duration::from_secs(30));
    ///
    /// // Periodic saves run in the background...
    ///
    /// scheduler.stop().await;
    /// ```
    pub fn start(store: Arc<Datastore>, gateway: Gateway, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(scheduler_loop(store, gateway, interval, shutdown_rx));

        info!(interval_secs = interval.as_secs_f64(), "Snapshot scheduler started");

        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    /// Stops the scheduler and waits until its task has exited.
    pub async fn stop(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Snapshot scheduler task failed");
            }
        }
        info!("Snapshot scheduler stopped");
    }
}

impl Drop for SnapshotScheduler {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// The main scheduler loop.
async fn scheduler_loop(
    store: Arc<Datastore>,
    gateway: Gateway,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // Wait for the next tick or shutdown signal
        tokio::select! {
            biased;
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Snapshot scheduler received shutdown signal");
                    return;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        match gateway.save_in_background(Arc::clone(&store)).await {
            Ok(()) => debug!(path = %gateway.path().display(), "Periodic snapshot saved"),
            Err(e) => error!(error = %e, "Periodic snapshot failed"),
        }
    }
}
