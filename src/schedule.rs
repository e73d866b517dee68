//! Fixed-cadence gate for the sampling pipeline.

use embassy_time::{Duration, Instant};

/// Lets the pipeline run at most once per interval.
///
/// The deadline advances by exactly one interval per accepted poll, so
/// the cadence does not drift with loop latency. A loop that falls
/// behind catches up one interval per call rather than bursting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    next_due: Instant,
    interval: Duration,
}

impl PollSchedule {
    /// First poll is due one `interval` after `start`.
    pub fn new(start: Instant, interval: Duration) -> Self {
        Self {
            next_due: start + interval,
            interval,
        }
    }

    /// Returns `true` if a tick is due at `now`, consuming that slot.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_due {
            return false;
        }
        self.next_due += self.interval;
        true
    }

    /// Instant at which the next tick becomes due.
    pub fn next_due(&self) -> Instant {
        self.next_due
    }
}
