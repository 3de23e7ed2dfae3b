//! Time sources
//!
//! The manager needs two kinds of time: a monotonic reading for the write
//! scheduler and a wall-clock instant to stamp profiles and attempts.
//! `SystemClock` serves real hosts, `ManualClock` lets tests advance time
//! by hand.

use chrono::{DateTime, TimeZone, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic and wall-clock time
pub trait Clock {
    /// Time elapsed since the clock's origin. Never goes backwards.
    fn elapsed(&self) -> Duration;

    /// Current wall-clock instant
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real time
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Virtual clock advanced explicitly.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the manager.
#[derive(Debug, Clone)]
pub struct ManualClock {
    offset: Rc<Cell<Duration>>,
    start: DateTime<Utc>,
}

impl ManualClock {
    /// Clock starting at the given wall-clock instant
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            offset: Rc::new(Cell::new(Duration::ZERO)),
            start,
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    /// Convenience for `advance(Duration::from_millis(ms))`
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        // 2024-01-01T00:00:00Z
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default();
        Self::starting_at(start)
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.offset.get()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(self.offset.get()).unwrap_or_else(|_| chrono::Duration::zero());
        self.start + offset
    }
}
