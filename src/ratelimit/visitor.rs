//! Per-client window state.

use std::time::{Duration, Instant};

/// Request accounting for a single client.
///
/// `last_seen` marks the start of the client's current window. It moves only
/// when a window is opened or reset, never on ordinary admitted requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitorRecord {
    /// When the current window was opened
    pub last_seen: Instant,
    /// Requests counted in the current window (always at least 1)
    pub count: u32,
}

impl VisitorRecord {
    /// Open a fresh window for a client's first request.
    pub fn new(now: Instant) -> Self {
        Self {
            last_seen: now,
            count: 1,
        }
    }

    /// Whether more than `window` has passed since the window was opened.
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > window
    }

    /// Start a new window at `now` with this request as its first.
    pub fn reset(&mut self, now: Instant) {
        self.count = 1;
        self.last_seen = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn test_new_record_counts_first_request() {
        let now = Instant::now();
        let record = VisitorRecord::new(now);
        assert_eq!(record.count, 1);
        assert_eq!(record.last_seen, now);
    }

    #[test]
    fn test_expiry_is_strict() {
        let start = Instant::now();
        let record = VisitorRecord::new(start);

        assert!(!record.is_expired(start, WINDOW));
        // Exactly one window later is still inside it
        assert!(!record.is_expired(start + WINDOW, WINDOW));
        assert!(record.is_expired(start + WINDOW + Duration::from_nanos(1), WINDOW));
    }

    #[test]
    fn test_earlier_instant_is_not_expired() {
        let start = Instant::now() + Duration::from_secs(5);
        let record = VisitorRecord::new(start);
        assert!(!record.is_expired(Instant::now(), WINDOW));
    }

    #[test]
    fn test_reset() {
        let start = Instant::now();
        let mut record = VisitorRecord::new(start);
        record.count = 42;

        let later = start + Duration::from_secs(90);
        record.reset(later);

        assert_eq!(record.count, 1);
        assert_eq!(record.last_seen, later);
    }
}
