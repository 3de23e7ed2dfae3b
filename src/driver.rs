//! Background flush driver for native hosts
//!
//! Browsers drive deferred work with timers; a native host needs something
//! to call `poll` periodically instead. The driver ticks on an interval,
//! and on shutdown writes out anything still pending so a clean exit loses
//! nothing.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::manager::LearningManager;
use crate::storage::KeyValueBackend;

/// Manager shared between the host and the driver task
pub type SharedManager<B, C> = Arc<Mutex<LearningManager<B, C>>>;

/// Handle to a running flush task
pub struct FlushDriver {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<usize>,
}

impl FlushDriver {
    /// Spawn the driver on the current tokio runtime.
    ///
    /// The driver never reports the host as idle; with idle scheduling
    /// enabled, writes run when the idle timeout passes.
    pub fn spawn<B, C>(manager: SharedManager<B, C>, interval: Duration) -> Self
    where
        B: KeyValueBackend + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut writes = 0usize;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let due = manager.lock().await.poll(false);
                        if due > 0 {
                            debug!(due, "flush driver wrote profile");
                            writes += due;
                        }
                    }
                    // Fires on shutdown and when the handle is dropped
                    _ = stop.changed() => break,
                }
            }

            let mut manager = manager.lock().await;
            if manager.has_pending_write() && manager.flush_now() {
                writes += 1;
            }
            info!(writes, "flush driver stopped");
            writes
        });

        Self { shutdown, handle }
    }

    /// Stop the driver, flushing pending work. Returns the number of
    /// physical writes the driver performed.
    pub async fn shutdown(self) -> Result<usize> {
        // The task may already have exited; nothing to signal then
        let _ = self.shutdown.send(true);
        self.handle.await.context("flush driver task panicked")
    }
}
