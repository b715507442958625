//! Periodic status telemetry.
//!
//! Elapsed time accumulates across ticks with the remainder carried over,
//! so over `N` seconds of ticks exactly `⌊N / interval⌋` lines go out,
//! independent of traffic, motion or tick jitter.

use std::time::Duration;

/// Fixed-interval `STATUS:` scheduler.
#[derive(Debug, Clone)]
pub struct StatusPublisher {
    interval: Duration,
    elapsed: Duration,
    published: u64,
}

impl StatusPublisher {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            published: 0,
        }
    }

    #[inline]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Lines due so far.
    #[inline]
    pub const fn published(&self) -> u64 {
        self.published
    }

    /// Account for `dt`; returns `true` when a line is due in this tick.
    pub fn tick(&mut self, dt: Duration) -> bool {
        self.elapsed += dt;
        if self.interval.is_zero() || self.elapsed < self.interval {
            return false;
        }
        self.elapsed -= self.interval;
        self.published += 1;
        true
    }
}
