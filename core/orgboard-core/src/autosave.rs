//! Autosave scheduling: debounced mutation writes plus an interval safety
//! net.
//!
//! Mutations schedule a write one quiet period in the future; another
//! mutation inside the window replaces the pending deadline, so a burst
//! coalesces into a single write. Independently, a fixed interval forces a
//! write regardless of activity. Both share this one schedule, and the owner
//! drives it by polling [`AutosaveSchedule::is_due`] from its event loop.
//!
//! Time is injected as `Instant` arguments, so tests exercise the schedule
//! without sleeping.

use std::time::{Duration, Instant};

/// Quiet period after the last mutation before a debounced write fires.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(2000);

/// Interval at which a write is forced even with no recent mutations.
pub const FORCED_SAVE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub struct AutosaveSchedule {
    debounce: Duration,
    interval: Duration,
    /// Pending debounced deadline; rescheduling replaces, never stacks.
    deadline: Option<Instant>,
    last_flush: Instant,
}

impl AutosaveSchedule {
    pub fn new(now: Instant) -> Self {
        Self::with_timing(DEBOUNCE_DELAY, FORCED_SAVE_INTERVAL, now)
    }

    pub fn with_timing(debounce: Duration, interval: Duration, now: Instant) -> Self {
        AutosaveSchedule {
            debounce,
            interval,
            deadline: None,
            last_flush: now,
        }
    }

    /// Records a mutation: the pending deadline moves to one full quiet
    /// period from `now`.
    pub fn note_mutation(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn has_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether a flush should run at `now`: either the debounced deadline
    /// has been reached, or the forced interval has elapsed since the last
    /// flush.
    pub fn is_due(&self, now: Instant) -> bool {
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                return true;
            }
        }
        now.saturating_duration_since(self.last_flush) >= self.interval
    }

    /// Clears the pending deadline and restarts the interval clock.
    pub fn mark_flushed(&mut self, now: Instant) {
        self.deadline = None;
        self.last_flush = now;
    }
}
