//! TTL Scavenger Task
//!
//! Background task that periodically removes stale cache entries and prunes
//! the trie branches they leave behind.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheShared;

// == Scavenger ==
/// Handle to the running scavenger task.
///
/// Dropping the handle signals the task to exit without waiting for it;
/// [`Scavenger::stop`] signals and waits.
#[derive(Debug)]
pub(crate) struct Scavenger {
    shutdown_tx: watch::Sender<bool>,
    interval_tx: watch::Sender<u64>,
    /// Held across the join so concurrent `stop` calls queue behind it
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scavenger {
    /// Spawns the scavenger on the current Tokio runtime.
    pub(crate) fn spawn(shared: Arc<CacheShared>, interval_ms: u64) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (interval_tx, interval_rx) = watch::channel(interval_ms);

        let handle = tokio::spawn(scavenge_loop(shared, interval_rx, shutdown_rx));

        Self {
            shutdown_tx,
            interval_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Publishes a new interval. The pending wait runs to completion and the
    /// wait after it uses `interval_ms`.
    pub(crate) fn reschedule(&self, interval_ms: u64) {
        self.interval_tx.send_replace(interval_ms);
    }

    /// Signals the task to exit and waits until it has.
    ///
    /// Every caller returns only after the task is gone, including callers
    /// that arrive while another `stop` is still waiting.
    pub(crate) async fn stop(&self) {
        self.shutdown_tx.send_replace(true);

        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.as_mut() {
            if let Err(err) = task.await {
                warn!(error = %err, "Scavenger task ended abnormally");
            }
            *handle = None;
            info!("Scavenger stopped");
        }
    }

    /// Returns true once the task has exited. While a `stop` is joining the
    /// task this reports false.
    pub(crate) fn is_finished(&self) -> bool {
        match self.handle.try_lock() {
            Ok(handle) => handle.as_ref().map_or(true, JoinHandle::is_finished),
            Err(_) => false,
        }
    }
}

impl Drop for Scavenger {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Sleeps for the current interval, sweeps, repeats until shut down.
///
/// The interval is read once per wait. A change never cuts a pending wait
/// short; it applies from the next wait on.
async fn scavenge_loop(
    shared: Arc<CacheShared>,
    interval_rx: watch::Receiver<u64>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    info!(
        "Starting scavenger with interval of {} ms",
        *interval_rx.borrow()
    );

    loop {
        if *shutdown_rx.borrow_and_update() {
            break;
        }
        let interval = Duration::from_millis(*interval_rx.borrow());

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }

        let removed = shared.sweep_expired(Utc::now());

        if removed > 0 {
            info!(
                "Scavenger: removed {} stale entries, {} remaining",
                removed,
                shared.len()
            );
        } else {
            debug!("Scavenger: no stale entries found");
        }
    }

    debug!("Scavenger received shutdown signal");
}
