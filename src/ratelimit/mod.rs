//! Per-client rate limiting and state eviction.

mod clock;
mod limiter;
mod sweeper;
mod visitor;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use limiter::{
    LimiterConfig, RateLimiter, DEFAULT_LIMIT, DEFAULT_SWEEP_INTERVAL, DEFAULT_WINDOW,
};
pub use sweeper::{Sweeper, MAX_SWEEP_INTERVAL, MIN_SWEEP_INTERVAL};
pub use visitor::VisitorRecord;
