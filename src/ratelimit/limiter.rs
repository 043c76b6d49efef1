//! Core rate limiter implementation.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use super::clock::{Clock, MonotonicClock};
use super::visitor::VisitorRecord;

/// Default length of a client's window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
/// Default number of admitted requests per client per window.
pub const DEFAULT_LIMIT: u32 = 100;
/// Default period between eviction sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Tunables for a [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    /// Length of each client's fixed window
    pub window: Duration,
    /// Maximum admitted requests per client per window. A client's first
    /// request in a window is always admitted, so the limiter treats `0` as `1`.
    pub limit: u32,
    /// How often the background sweep evicts expired clients
    pub sweep_interval: Duration,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            limit: DEFAULT_LIMIT,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl LimiterConfig {
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }
}

/// In-memory per-client fixed-window rate limiter.
///
/// Each client gets `limit` admitted requests per window. The window is
/// anchored to the first request that opened it; admitted requests inside the
/// window do not move it, and neither do rejected ones. The first request
/// after the window has elapsed resets the count and is always admitted.
///
/// All state lives behind one mutex that is held for the full duration of
/// [`allow`](Self::allow) and [`sweep`](Self::sweep), so the two never observe
/// each other half-way. Memory for idle clients is reclaimed only by `sweep`;
/// see [`Sweeper`](super::Sweeper) for running it periodically.
#[derive(Debug)]
pub struct RateLimiter {
    visitors: Mutex<HashMap<String, VisitorRecord>>,
    config: LimiterConfig,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a rate limiter using the system monotonic clock.
    pub fn new(config: LimiterConfig) -> Self {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    /// Create a rate limiter reading time from `clock`.
    ///
    /// A zero `limit` is raised to 1.
    pub fn with_clock(config: LimiterConfig, clock: Arc<dyn Clock>) -> Self {
        let config = config.with_limit(config.limit.max(1));
        Self {
            visitors: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Decide whether a request from `client_id` is admitted.
    ///
    /// Any string is accepted as a key.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = self.clock.now();
        let mut visitors = self.visitors.lock();

        let Some(record) = visitors.get_mut(client_id) else {
            trace!(client = %client_id, "Tracking new client");
            visitors.insert(client_id.to_owned(), VisitorRecord::new(now));
            return true;
        };

        if record.is_expired(now, self.config.window) {
            record.reset(now);
            return true;
        }

        if record.count >= self.config.limit {
            debug!(
                client = %client_id,
                count = record.count,
                limit = self.config.limit,
                "Rate limit exceeded"
            );
            return false;
        }

        record.count += 1;
        true
    }

    /// Evict every client whose window has expired.
    ///
    /// Returns the number of records removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let window = self.config.window;
        let mut visitors = self.visitors.lock();

        let before = visitors.len();
        visitors.retain(|_, record| !record.is_expired(now, window));
        let evicted = before - visitors.len();

        debug!(
            evicted = evicted,
            remaining = visitors.len(),
            "Swept expired clients"
        );
        evicted
    }

    /// Snapshot of the record tracked for `client_id`, if any.
    pub fn visitor(&self, client_id: &str) -> Option<VisitorRecord> {
        self.visitors.lock().get(client_id).copied()
    }

    /// Requests `client_id` may still make in its current window.
    pub fn remaining(&self, client_id: &str) -> u32 {
        let now = self.clock.now();
        match self.visitors.lock().get(client_id) {
            Some(record) if !record.is_expired(now, self.config.window) => {
                self.config.limit.saturating_sub(record.count)
            }
            _ => self.config.limit,
        }
    }

    /// Number of clients currently tracked.
    pub fn visitor_count(&self) -> usize {
        self.visitors.lock().len()
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Drop all tracked clients.
    pub fn clear(&self) {
        self.visitors.lock().clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(LimiterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::ManualClock;

    fn limiter_with_clock(limit: u32) -> (RateLimiter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let config = LimiterConfig::default().with_limit(limit);
        (RateLimiter::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.visitor_count(), 0);
        assert_eq!(limiter.config().limit, 100);
        assert_eq!(limiter.config().window, Duration::from_secs(60));
        assert_eq!(limiter.config().sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_first_request_is_admitted() {
        let (limiter, _clock) = limiter_with_clock(100);

        assert!(limiter.allow("10.0.0.1"));

        let record = limiter.visitor("10.0.0.1").unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(limiter.visitor_count(), 1);
    }

    #[test]
    fn test_limit_then_reject() {
        let (limiter, _clock) = limiter_with_clock(100);

        for _ in 0..100 {
            assert!(limiter.allow("A"));
        }
        assert!(!limiter.allow("A"));
        assert_eq!(limiter.remaining("A"), 0);
    }

    #[test]
    fn test_rejections_do_not_count_or_extend_window() {
        let (limiter, clock) = limiter_with_clock(5);

        for _ in 0..5 {
            assert!(limiter.allow("A"));
        }
        let opened = limiter.visitor("A").unwrap().last_seen;

        clock.advance(Duration::from_secs(30));
        for _ in 0..20 {
            assert!(!limiter.allow("A"));
        }

        let record = limiter.visitor("A").unwrap();
        assert_eq!(record.count, 5);
        assert_eq!(record.last_seen, opened);
    }

    #[test]
    fn test_window_is_anchored_to_first_request() {
        let (limiter, clock) = limiter_with_clock(3);

        assert!(limiter.allow("A"));
        let opened = limiter.visitor("A").unwrap().last_seen;

        // Admitted requests later in the window leave the anchor alone
        clock.advance(Duration::from_secs(50));
        assert!(limiter.allow("A"));
        assert!(limiter.allow("A"));
        assert_eq!(limiter.visitor("A").unwrap().last_seen, opened);

        // 61s after the first request the window has expired, even though the
        // latest admitted request was only 11s ago
        clock.advance(Duration::from_secs(11));
        assert!(limiter.allow("A"));
        let record = limiter.visitor("A").unwrap();
        assert_eq!(record.count, 1);
        assert_eq!(record.last_seen, clock.now());
    }

    #[test]
    fn test_window_reset_after_expiry() {
        let (limiter, clock) = limiter_with_clock(100);

        for _ in 0..100 {
            assert!(limiter.allow("A"));
        }
        assert!(!limiter.allow("A"));

        clock.advance(Duration::from_secs(61));
        assert!(limiter.allow("A"));
        assert_eq!(limiter.visitor("A").unwrap().count, 1);
        assert_eq!(limiter.remaining("A"), 99);

        for _ in 0..99 {
            assert!(limiter.allow("A"));
        }
        assert!(!limiter.allow("A"));
    }

    #[test]
    fn test_exactly_one_window_is_still_active() {
        let (limiter, clock) = limiter_with_clock(1);

        assert!(limiter.allow("A"));
        clock.advance(Duration::from_secs(60));
        assert!(!limiter.allow("A"));

        clock.advance(Duration::from_millis(1));
        assert!(limiter.allow("A"));
    }

    #[test]
    fn test_clients_have_separate_budgets() {
        let (limiter, _clock) = limiter_with_clock(2);

        assert!(limiter.allow("A"));
        assert!(limiter.allow("A"));
        assert!(!limiter.allow("A"));

        assert!(limiter.allow("B"));
        assert_eq!(limiter.remaining("B"), 1);
        assert_eq!(limiter.visitor_count(), 2);
    }

    #[test]
    fn test_any_string_is_a_key() {
        let (limiter, _clock) = limiter_with_clock(1);

        assert!(limiter.allow(""));
        assert!(limiter.allow("not an ip address"));
        assert!(!limiter.allow(""));
    }

    #[test]
    fn test_remaining_for_unknown_and_expired_clients() {
        let (limiter, clock) = limiter_with_clock(10);
        assert_eq!(limiter.remaining("nobody"), 10);

        limiter.allow("A");
        limiter.allow("A");
        assert_eq!(limiter.remaining("A"), 8);

        clock.advance(Duration::from_secs(61));
        assert_eq!(limiter.remaining("A"), 10);
    }

    #[test]
    fn test_sweep_evicts_only_expired() {
        let (limiter, clock) = limiter_with_clock(10);

        limiter.allow("old");
        clock.advance(Duration::from_secs(40));
        limiter.allow("new");
        clock.advance(Duration::from_secs(21));

        assert_eq!(limiter.sweep(), 1);
        assert!(limiter.visitor("old").is_none());
        assert!(limiter.visitor("new").is_some());
        assert_eq!(limiter.visitor_count(), 1);
    }

    #[test]
    fn test_swept_client_starts_fresh() {
        let (limiter, clock) = limiter_with_clock(2);

        assert!(limiter.allow("A"));
        assert!(limiter.allow("A"));
        assert!(!limiter.allow("A"));

        clock.advance(Duration::from_secs(61));
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.visitor_count(), 0);

        assert!(limiter.allow("A"));
        assert_eq!(limiter.visitor("A").unwrap().count, 1);
    }

    #[test]
    fn test_sweep_with_nothing_expired() {
        let (limiter, _clock) = limiter_with_clock(10);
        limiter.allow("A");
        assert_eq!(limiter.sweep(), 0);
        assert_eq!(limiter.visitor_count(), 1);
    }

    #[test]
    fn test_clear() {
        let (limiter, _clock) = limiter_with_clock(10);
        limiter.allow("A");
        limiter.allow("B");
        assert_eq!(limiter.visitor_count(), 2);

        limiter.clear();
        assert_eq!(limiter.visitor_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_distinct_clients() {
        let limiter = Arc::new(RateLimiter::default());

        let tasks: Vec<_> = (0..1000)
            .map(|i| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.allow(&format!("client-{i}")) })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap());
        }
        assert_eq!(limiter.visitor_count(), 1000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_client() {
        let limiter = Arc::new(RateLimiter::default());

        let tasks: Vec<_> = (0..150)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.allow("shared") })
            })
            .collect();

        let mut admitted = 0;
        let mut rejected = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            } else {
                rejected += 1;
            }
        }

        assert_eq!(admitted, 100);
        assert_eq!(rejected, 50);
        assert_eq!(limiter.visitor("shared").unwrap().count, 100);
    }

    #[test]
    fn test_zero_limit_is_raised_to_one() {
        let (limiter, _clock) = limiter_with_clock(0);
        assert_eq!(limiter.config().limit, 1);

        assert!(limiter.allow("A"));
        assert!(!limiter.allow("A"));
        assert_eq!(limiter.visitor("A").unwrap().count, 1);
        assert_eq!(limiter.remaining("A"), 0);
    }

    async fn hammer(
        limiter: Arc<RateLimiter>,
        clients: Vec<String>,
        rounds: usize,
    ) -> Vec<usize> {
        let mut admitted = vec![0; clients.len()];
        for _ in 0..rounds {
            for (i, client) in clients.iter().enumerate() {
                if limiter.allow(client) {
                    admitted[i] += 1;
                }
            }
            tokio::task::yield_now().await;
        }
        admitted
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_allow_races_with_sweep() {
        const LIMIT: u32 = 5;
        const WORKERS: usize = 8;

        let clock = Arc::new(ManualClock::new());
        let config = LimiterConfig::default().with_limit(LIMIT);
        let limiter = Arc::new(RateLimiter::with_clock(config, clock.clone()));
        let clients: Vec<String> = (0..10).map(|i| format!("client-{i}")).collect();

        let stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let sweeping = {
            let limiter = Arc::clone(&limiter);
            let stop = Arc::clone(&stop);
            tokio::spawn(async move {
                while !stop.load(std::sync::atomic::Ordering::Relaxed) {
                    limiter.sweep();
                    tokio::task::yield_now().await;
                }
            })
        };

        // Each phase runs inside one window, so every client gets exactly
        // LIMIT admits no matter how sweeps interleave. Between phases the
        // clock moves past the window and sweeps race with the resets.
        for phase in 0..3 {
            if phase > 0 {
                clock.advance(Duration::from_secs(61));
            }

            let workers: Vec<_> = (0..WORKERS)
                .map(|_| tokio::spawn(hammer(Arc::clone(&limiter), clients.clone(), 20)))
                .collect();

            let mut totals = vec![0usize; clients.len()];
            for worker in workers {
                for (total, admitted) in totals.iter_mut().zip(worker.await.unwrap()) {
                    *total += admitted;
                }
            }

            for (client, total) in clients.iter().zip(&totals) {
                assert_eq!(*total, LIMIT as usize, "{client} in phase {phase}");
                let record = limiter.visitor(client).unwrap();
                assert!((1..=LIMIT).contains(&record.count));
                assert!(!limiter.allow(client));
            }
        }

        stop.store(true, std::sync::atomic::Ordering::Relaxed);
        sweeping.await.unwrap();

        clock.advance(Duration::from_secs(61));
        assert_eq!(limiter.sweep(), clients.len());
    }
}
