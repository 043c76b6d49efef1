//! Background eviction of expired clients.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::limiter::RateLimiter;

/// Shortest period the sweep task ticks at.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);
/// Longest period the sweep task ticks at.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Owned handle to the task that periodically sweeps a [`RateLimiter`].
///
/// The task ticks every `sweep_interval` from the limiter's config, starting
/// one interval after spawn. Intervals outside
/// [`MIN_SWEEP_INTERVAL`]..=[`MAX_SWEEP_INTERVAL`] are clamped. It stops when [`shutdown`](Self::shutdown) is
/// called, when the handle is dropped, or when the limiter itself is gone.
pub struct Sweeper {
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn the sweep task on the current tokio runtime.
    pub fn spawn(limiter: &Arc<RateLimiter>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        let period = clamp_period(limiter.config().sweep_interval);
        let handle = tokio::spawn(run(Arc::downgrade(limiter), period, stop_rx));

        info!(interval = ?period, "Rate limiter sweeper started");

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Stop the sweep task and wait for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Sweeper task ended abnormally");
            }
        }
    }

    /// Whether the sweep task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

fn clamp_period(requested: Duration) -> Duration {
    let period = requested.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL);
    if period != requested {
        warn!(
            requested = ?requested,
            interval = ?period,
            "Sweep interval out of range, clamping"
        );
    }
    period
}

async fn run(limiter: Weak<RateLimiter>, period: Duration, mut stop_rx: watch::Receiver<bool>) {
    let start = Instant::now()
        .checked_add(period)
        .unwrap_or_else(|| Instant::now() + MIN_SWEEP_INTERVAL);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(limiter) = limiter.upgrade() else {
                    debug!("Rate limiter dropped, sweeper exiting");
                    break;
                };
                limiter.sweep();
            }
            changed = stop_rx.changed() => {
                // A closed channel means the handle is gone too
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Rate limiter sweeper stopped");
}
