//! Deferred write scheduling
//!
//! A debounce window followed by idle-time execution, kept as plain data
//! and driven by explicit `poll` calls against a monotonic reading. Nothing
//! here knows what is being written: each fired task tells the caller to
//! serialize whatever the current state is at that moment.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::debug;

use crate::config::{IdleSupport, TrackerConfig};

/// Debounce-then-idle write scheduler
#[derive(Debug, Clone)]
pub struct WriteScheduler {
    window: Duration,
    idle: IdleSupport,
    /// Expiry of the current debounce window
    debounce_deadline: Option<Duration>,
    /// Writes already past the window, by the time each must run
    /// whether or not the host went idle
    idle_queue: VecDeque<Duration>,
}

impl WriteScheduler {
    pub fn new(window: Duration, idle: IdleSupport) -> Self {
        Self {
            window,
            idle,
            debounce_deadline: None,
            idle_queue: VecDeque::new(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.debounce_window(), config.idle)
    }

    /// Start or restart the debounce window at `now`
    pub fn arm(&mut self, now: Duration) {
        self.debounce_deadline = Some(now + self.window);
    }

    /// Drop all pending work. Returns whether anything was pending.
    pub fn flush_now(&mut self) -> bool {
        let had_pending = self.is_pending();
        self.debounce_deadline = None;
        self.idle_queue.clear();
        had_pending
    }

    /// Debounce window running or idle tasks queued
    pub fn is_pending(&self) -> bool {
        self.debounce_deadline.is_some() || !self.idle_queue.is_empty()
    }

    /// Number of tasks waiting on the idle facility
    pub fn queued(&self) -> usize {
        self.idle_queue.len()
    }

    /// Advance to `now` and return how many writes are due.
    ///
    /// `host_idle` is the host's report that it has spare time; it is
    /// ignored when idle scheduling is unavailable.
    pub fn poll(&mut self, now: Duration, host_idle: bool) -> usize {
        if let Some(deadline) = self.debounce_deadline {
            if now >= deadline {
                self.debounce_deadline = None;
                let run_by = deadline + self.idle_delay();
                debug!(?deadline, ?run_by, "debounce window elapsed, queued idle write");
                self.idle_queue.push_back(run_by);
            }
        }

        let run_on_idle = host_idle && matches!(self.idle, IdleSupport::Available { .. });
        let mut due = 0;
        while let Some(&run_by) = self.idle_queue.front() {
            if run_on_idle || now >= run_by {
                self.idle_queue.pop_front();
                due += 1;
            } else {
                break;
            }
        }
        due
    }

    /// Earliest instant at which `poll` could fire without an idle report
    pub fn next_deadline(&self) -> Option<Duration> {
        let queued = self.idle_queue.front().copied();
        match (self.debounce_deadline, queued) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn idle_delay(&self) -> Duration {
        match self.idle {
            IdleSupport::Available { timeout_ms } => Duration::from_millis(timeout_ms),
            IdleSupport::Unavailable { fallback_delay_ms } => Duration::from_millis(fallback_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn fallback_scheduler() -> WriteScheduler {
        WriteScheduler::new(ms(300), IdleSupport::fallback())
    }

    #[test]
    fn test_nothing_due_before_window() {
        let mut s = fallback_scheduler();
        s.arm(ms(0));
        assert_eq!(s.poll(ms(299), true), 0);
        assert!(s.is_pending());
    }

    #[test]
    fn test_fallback_delay_after_window() {
        let mut s = fallback_scheduler();
        s.arm(ms(0));
        assert_eq!(s.poll(ms(300), false), 0);
        assert_eq!(s.queued(), 1);
        assert_eq!(s.poll(ms(549), false), 0);
        assert_eq!(s.poll(ms(550), false), 1);
        assert!(!s.is_pending());
    }

    #[test]
    fn test_rearm_extends_window() {
        let mut s = fallback_scheduler();
        s.arm(ms(0));
        s.arm(ms(200));
        s.arm(ms(400));
        assert_eq!(s.poll(ms(650), false), 0);
        assert_eq!(s.queued(), 0);
        assert_eq!(s.next_deadline(), Some(ms(700)));
        assert_eq!(s.poll(ms(700 + 250), false), 1);
    }

    #[test]
    fn test_idle_report_runs_immediately_after_window() {
        let mut s = WriteScheduler::new(ms(300), IdleSupport::Available { timeout_ms: 1000 });
        s.arm(ms(0));
        assert_eq!(s.poll(ms(100), true), 0);
        assert_eq!(s.poll(ms(300), true), 1);
    }

    #[test]
    fn test_idle_timeout_without_idle_report() {
        let mut s = WriteScheduler::new(ms(300), IdleSupport::Available { timeout_ms: 1000 });
        s.arm(ms(0));
        assert_eq!(s.poll(ms(1299), false), 0);
        assert_eq!(s.poll(ms(1300), false), 1);
    }

    #[test]
    fn test_idle_report_ignored_when_unavailable() {
        let mut s = fallback_scheduler();
        s.arm(ms(0));
        assert_eq!(s.poll(ms(300), true), 0);
        assert_eq!(s.poll(ms(550), true), 1);
    }

    #[test]
    fn test_second_window_while_task_queued() {
        let mut s = fallback_scheduler();
        s.arm(ms(0));
        s.poll(ms(300), false);
        // another burst starts before the queued task has run
        s.arm(ms(310));
        assert_eq!(s.poll(ms(550), false), 1);
        assert!(s.is_pending());
        assert_eq!(s.poll(ms(610 + 250), false), 1);
        assert!(!s.is_pending());
    }

    #[test]
    fn test_flush_now_clears_everything() {
        let mut s = fallback_scheduler();
        assert!(!s.flush_now());
        s.arm(ms(0));
        s.poll(ms(300), false);
        s.arm(ms(320));
        assert!(s.flush_now());
        assert!(!s.is_pending());
        assert_eq!(s.next_deadline(), None);
        assert_eq!(s.poll(ms(10_000), false), 0);
    }
}
