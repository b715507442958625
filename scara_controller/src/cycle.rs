//! Cycle runner: paces [`Controller::tick`] at the configured cycle time.
//!
//! ## Cycle Body
//! Drain received bytes → tick the controller → write replies. Refusals
//! raised while draining (queue overflow, an unterminated last line) go out
//! ahead of the tick's replies.
//!
//! ## Pacing
//! `std::thread::sleep` for the remainder of the cycle. Overruns are counted
//! and logged; they never stop the loop. The `dt` passed to the controller is
//! the measured time since the previous cycle, so late cycles do not slow the
//! motion profile down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use scara_common::hal::MotionHal;
use scara_common::protocol::Reply;
use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::error::{CycleError, LinkError};
use crate::link::SerialLink;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: u64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: u64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: u64,
    /// Running sum for average computation.
    pub sum_cycle_ns: u128,
    /// Number of overruns detected.
    pub overruns: u64,
}

impl CycleStats {
    /// Create a new zeroed stats instance.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: u64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
        }
    }

    /// Record a cycle duration. O(1), no allocation.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += u128::from(duration_ns);
    }

    /// Average cycle time [ns] (returns 0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> u64 {
        if self.cycle_count == 0 {
            0
        } else {
            (self.sum_cycle_ns / u128::from(self.cycle_count)) as u64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the controller, the HAL and the link, and drives the loop.
pub struct CycleRunner<H: MotionHal> {
    controller: Controller,
    hal: H,
    link: SerialLink,
    cycle_time: Duration,
    stats: CycleStats,
    running: Arc<AtomicBool>,
    replies: Vec<Reply>,
    link_closed: bool,
}

impl<H: MotionHal> CycleRunner<H> {
    pub fn new(
        controller: Controller,
        hal: H,
        link: SerialLink,
        cycle_time: Duration,
        running: Arc<AtomicBool>,
    ) -> Result<Self, CycleError> {
        if cycle_time.is_zero() {
            return Err(CycleError::Setup("cycle time must be > 0".to_string()));
        }
        Ok(Self {
            controller,
            hal,
            link,
            cycle_time,
            stats: CycleStats::new(),
            running,
            replies: Vec::with_capacity(8),
            link_closed: false,
        })
    }

    #[inline]
    pub const fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    #[inline]
    pub const fn hal(&self) -> &H {
        &self.hal
    }

    /// Run until the shutdown flag clears, or the link has closed and the
    /// controller has finished the work already received.
    pub fn run(&mut self) -> Result<(), CycleError> {
        info!(
            cycle_us = self.cycle_time.as_micros() as u64,
            hal = self.hal.name(),
            "entering control loop"
        );
        let mut last = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let dt = cycle_start - last;
            last = cycle_start;

            self.cycle_body(dt)?;

            if self.link_closed && self.controller.is_idle() {
                info!("link closed and controller idle, leaving control loop");
                break;
            }

            let elapsed = cycle_start.elapsed();
            self.stats.record(elapsed.as_nanos() as u64);
            if elapsed > self.cycle_time {
                self.stats.overruns += 1;
                if self.stats.overruns == 1 || self.stats.overruns % 1000 == 0 {
                    warn!(
                        elapsed_us = elapsed.as_micros() as u64,
                        overruns = self.stats.overruns,
                        "cycle overrun"
                    );
                }
            }

            if let Some(remaining) = self.cycle_time.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }

        info!(
            cycles = self.stats.cycle_count,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            overruns = self.stats.overruns,
            "control loop stopped"
        );
        Ok(())
    }

    /// One cycle: input → tick → output.
    pub fn cycle_body(&mut self, dt: Duration) -> Result<(), CycleError> {
        self.replies.clear();

        // Drain whatever the reader thread has delivered.
        while !self.link_closed {
            match self.link.poll() {
                Ok(Some(chunk)) => self.controller.feed(&chunk, &mut self.replies),
                Ok(None) => break,
                Err(LinkError::Closed) => {
                    debug!("serial input closed");
                    self.link_closed = true;
                    self.controller.close_input(&mut self.replies);
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.controller.tick(dt, &mut self.hal, &mut self.replies);
        for reply in &self.replies {
            self.link.send(reply)?;
        }
        Ok(())
    }
}
