//! Per-axis non-blocking trajectory executor.
//!
//! Each [`AxisMotionChannel`] owns the authoritative step position of one
//! axis and walks it towards a target with a trapezoidal speed profile:
//! accelerate up to the configured maximum, cruise, then decelerate once the
//! stopping distance `v² / 2a` covers the remaining distance.
//!
//! `tick(dt)` is called once per control cycle and emits at most one step.
//! Fractional progress carries over between ticks so the step rate follows
//! the profile independent of the cycle time.

use scara_common::hal::{Axis, Direction};
use tracing::trace;

use crate::error::AxisError;

/// Trajectory state of one stepper axis.
#[derive(Debug, Clone)]
pub struct AxisMotionChannel {
    axis: Axis,
    /// Current step position (authoritative).
    position: i64,
    /// Commanded step position.
    target: i64,
    /// Cruise speed [steps/s].
    max_speed: f64,
    /// Acceleration and deceleration [steps/s²].
    accel: f64,
    /// Current speed magnitude [steps/s].
    speed: f64,
    /// Direction of travel while moving.
    direction: Option<Direction>,
    /// Accumulated fraction of the next step.
    progress: f64,
    /// Set by the emergency latch; refuses new targets.
    inhibited: bool,
}

impl AxisMotionChannel {
    /// Idle channel at step 0.
    pub fn new(axis: Axis, max_speed: f64, accel: f64) -> Self {
        Self {
            axis,
            position: 0,
            target: 0,
            max_speed,
            accel,
            speed: 0.0,
            direction: None,
            progress: 0.0,
            inhibited: false,
        }
    }

    #[inline]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Current step position.
    #[inline]
    pub const fn position(&self) -> i64 {
        self.position
    }

    /// Commanded step position.
    #[inline]
    pub const fn target(&self) -> i64 {
        self.target
    }

    /// Current speed magnitude [steps/s].
    #[inline]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    #[inline]
    pub const fn max_speed(&self) -> f64 {
        self.max_speed
    }

    #[inline]
    pub const fn acceleration(&self) -> f64 {
        self.accel
    }

    /// Whether steps remain to be emitted.
    #[inline]
    pub const fn is_active(&self) -> bool {
        self.position != self.target
    }

    #[inline]
    pub const fn is_inhibited(&self) -> bool {
        self.inhibited
    }

    /// Set the target relative to the current position.
    pub fn set_target(&mut self, delta_steps: i64) -> Result<(), AxisError> {
        if self.inhibited {
            return Err(AxisError::Inhibited(self.axis));
        }
        self.target = self.position + delta_steps;
        Ok(())
    }

    /// Set an absolute target.
    pub fn move_to(&mut self, abs_steps: i64) -> Result<(), AxisError> {
        self.set_target(abs_steps - self.position)
    }

    /// Set the cruise speed. Takes effect on the next tick.
    pub fn set_max_speed(&mut self, steps_per_sec: f64) {
        self.max_speed = steps_per_sec;
    }

    /// Set the acceleration. Takes effect on the next tick.
    pub fn set_acceleration(&mut self, steps_per_sec2: f64) {
        self.accel = steps_per_sec2;
    }

    /// Drop all remaining distance and speed at once.
    pub fn stop_immediately(&mut self) {
        self.target = self.position;
        self.speed = 0.0;
        self.direction = None;
        self.progress = 0.0;
    }

    /// Stop and refuse new targets until [`release`](Self::release).
    pub fn inhibit(&mut self) {
        self.stop_immediately();
        self.inhibited = true;
    }

    /// Accept targets again.
    pub fn release(&mut self) {
        self.inhibited = false;
    }

    /// Lowest speed the profile ramps down to. Reaching it from rest takes
    /// one step, so a move never stalls short of its target.
    #[inline]
    fn floor_speed(&self) -> f64 {
        self.max_speed.min((2.0 * self.accel).sqrt())
    }

    /// Advance the profile by `dt` seconds.
    ///
    /// Returns the direction of the step taken, if any. Never more than one
    /// step per call.
    pub fn tick(&mut self, dt: f64) -> Option<Direction> {
        let delta = self.target - self.position;
        let Some(wanted) = Direction::of(delta) else {
            self.speed = 0.0;
            self.direction = None;
            self.progress = 0.0;
            return None;
        };

        let floor = self.floor_speed();
        let mut dir = self.direction.unwrap_or(wanted);
        let remaining = if dir == wanted { delta.unsigned_abs() as f64 } else { 0.0 };
        let stopping = self.speed * self.speed / (2.0 * self.accel);

        self.speed = if dir != wanted || stopping >= remaining {
            (self.speed - self.accel * dt).max(floor)
        } else {
            (self.speed + self.accel * dt).min(self.max_speed).max(floor)
        };

        // Reverse only once slowed down to the floor speed.
        if dir != wanted && self.speed <= floor {
            dir = wanted;
            self.progress = 0.0;
        }
        self.direction = Some(dir);

        self.progress += self.speed * dt;
        if self.progress < 1.0 {
            return None;
        }
        self.progress = (self.progress - 1.0).min(1.0);
        self.position += dir.sign();
        trace!(axis = %self.axis, position = self.position, speed = self.speed, "step");

        if self.position == self.target {
            self.speed = 0.0;
            self.direction = None;
            self.progress = 0.0;
        }
        Some(dir)
    }
}
