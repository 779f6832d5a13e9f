//! Background maintenance daemon for cache tiers.
//!
//! Each tier that needs periodic work (expiry sweeps, orphan cleanup,
//! index flushes) implements [`Maintainable`]. The daemon runs one tokio
//! task per registered tier, ticking at the tier's own interval until the
//! shared cancellation token fires.
//!
//! # Shutdown
//!
//! [`MaintenanceDaemon::stop`] cancels every task and joins them with a
//! bounded timeout. Tasks that fail to finish in time are aborted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::traits::BoxFuture;

/// Default bound on joining maintenance tasks at shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Floor applied to tier intervals so a zero interval cannot spin.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// A tier with periodic background work.
pub trait Maintainable: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// How often the daemon should tick.
    fn interval(&self) -> Duration;

    /// Run one maintenance pass. Returns the number of entries removed.
    fn run_maintenance(&self) -> BoxFuture<'_, usize>;
}

/// Cancellable set of periodic maintenance tasks.
pub struct MaintenanceDaemon {
    shutdown: CancellationToken,
    handles: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    shutdown_timeout: Duration,
}

impl MaintenanceDaemon {
    /// Create a daemon with no tasks.
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            shutdown: CancellationToken::new(),
            handles: Mutex::new(Vec::new()),
            shutdown_timeout,
        }
    }

    /// Spawn a maintenance task for `target`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, target: Arc<dyn Maintainable>) {
        let name = target.name();
        let token = self.shutdown.clone();
        let handle = tokio::spawn(run_maintenance_loop(target, token));
        self.handles.lock().push((name, handle));
    }

    /// Number of tasks that have not finished.
    pub fn active_tasks(&self) -> usize {
        self.handles
            .lock()
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }

    /// True until [`stop`](Self::stop) has been called.
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Cancel every task and wait for them, bounded by the shutdown timeout.
    pub async fn stop(&self) {
        self.shutdown.cancel();

        let handles: Vec<_> = std::mem::take(&mut *self.handles.lock());
        let deadline = Instant::now() + self.shutdown_timeout;

        for (name, mut handle) in handles {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, &mut handle).await {
                Ok(Ok(())) => debug!(task = name, "Maintenance task stopped"),
                Ok(Err(e)) => warn!(task = name, error = %e, "Maintenance task panicked"),
                Err(_) => {
                    warn!(
                        task = name,
                        timeout_ms = self.shutdown_timeout.as_millis() as u64,
                        "Maintenance task did not stop in time, aborting"
                    );
                    handle.abort();
                }
            }
        }

        info!("Maintenance daemon stopped");
    }
}

impl Drop for MaintenanceDaemon {
    fn drop(&mut self) {
        // Signal shutdown if not already done
        self.shutdown.cancel();
    }
}

async fn run_maintenance_loop(target: Arc<dyn Maintainable>, shutdown: CancellationToken) {
    let name = target.name();
    let interval = target.interval().max(MIN_TICK_INTERVAL);

    info!(
        task = name,
        interval_ms = interval.as_millis() as u64,
        "Maintenance task started"
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(task = name, "Maintenance task shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                let removed = target.run_maintenance().await;
                if removed > 0 {
                    debug!(task = name, removed, "Maintenance pass complete");
                }
            }
        }
    }
}
