//! Composite motion sequencer.
//!
//! Pick, place and vision-pick expand into a short list of [`SequenceStep`]s
//! that run one after another. A step starts only once every axis channel is
//! idle, and a gripper step additionally waits for the servo settle time, so
//! sub-steps never overlap. The sequencer never blocks; it is polled once per
//! tick.
//!
//! ## Phases
//!
//! ```text
//! Pick(x,y):  MoveTo(x,y,safe,fast) → MoveTo(x,y,0,slow) → Gripper(closed) → MoveTo(x,y,safe,fast)
//! Place(x,y): MoveTo(x,y,safe,fast) → MoveTo(x,y,0,slow) → Gripper(open)   → MoveTo(x,y,safe,fast)
//! ```

use std::time::Duration;

use scara_common::config::{GripperConfig, SequenceConfig};
use scara_common::protocol::{CommandError, Reply};
use tracing::{debug, info};

use crate::error::AxisError;

/// Longest expansion (pick / place).
pub const MAX_SEQUENCE_STEPS: usize = 4;

/// One sub-step of a composite command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequenceStep {
    /// Absolute move of all axes [mm] at a 0–100 speed setting.
    MoveTo { x: f64, y: f64, z: f64, speed: u8 },
    /// Gripper angle [deg].
    Gripper { angle: f64 },
}

/// Parameters shared by the pick / place expansions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceParams {
    pub safe_height: f64,
    pub fast_speed: u8,
    pub slow_speed: u8,
    pub open_angle: f64,
    pub closed_angle: f64,
    pub settle: Duration,
}

impl SequenceParams {
    pub fn new(sequence: &SequenceConfig, gripper: &GripperConfig) -> Self {
        Self {
            safe_height: sequence.safe_height,
            fast_speed: sequence.fast_speed,
            slow_speed: sequence.slow_speed,
            open_angle: gripper.open_angle,
            closed_angle: gripper.closed_angle,
            settle: Duration::from_millis(gripper.settle_ms),
        }
    }
}

/// Ordered steps plus a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    steps: heapless::Vec<SequenceStep, MAX_SEQUENCE_STEPS>,
    cursor: usize,
    /// Reply sent when the last step completes; `None` if the originating
    /// line was already acknowledged.
    completion: Option<Reply>,
    /// Originating line, echoed in abort reports.
    raw: String,
}

impl Sequence {
    fn from_steps(steps: &[SequenceStep], completion: Option<Reply>, raw: &str) -> Self {
        let mut list = heapless::Vec::new();
        for step in steps.iter().take(MAX_SEQUENCE_STEPS) {
            // Capacity is checked by `take`.
            let _ = list.push(*step);
        }
        Self {
            steps: list,
            cursor: 0,
            completion,
            raw: raw.to_string(),
        }
    }

    /// Single absolute move, acknowledged at accept time.
    pub fn move_to(x: f64, y: f64, z: f64, speed: u8, raw: &str) -> Self {
        Self::from_steps(&[SequenceStep::MoveTo { x, y, z, speed }], None, raw)
    }

    /// Descend at `(x, y)`, close the gripper, lift. Replies `OK` when done.
    pub fn pick(x: f64, y: f64, params: &SequenceParams, raw: &str) -> Self {
        Self::grasp(x, y, params.closed_angle, params, raw)
    }

    /// Descend at `(x, y)`, open the gripper, lift. Replies `OK` when done.
    pub fn place(x: f64, y: f64, params: &SequenceParams, raw: &str) -> Self {
        Self::grasp(x, y, params.open_angle, params, raw)
    }

    fn grasp(x: f64, y: f64, angle: f64, p: &SequenceParams, raw: &str) -> Self {
        let above = SequenceStep::MoveTo {
            x,
            y,
            z: p.safe_height,
            speed: p.fast_speed,
        };
        let steps = [
            above,
            SequenceStep::MoveTo {
                x,
                y,
                z: 0.0,
                speed: p.slow_speed,
            },
            SequenceStep::Gripper { angle },
            above,
        ];
        Self::from_steps(&steps, Some(Reply::Ok), raw)
    }

    #[inline]
    pub fn steps(&self) -> &[SequenceStep] {
        &self.steps
    }

    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Steps not started yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.steps.len() - self.cursor
    }

    fn next_step(&mut self) -> Option<SequenceStep> {
        let step = self.steps.get(self.cursor).copied();
        if step.is_some() {
            self.cursor += 1;
        }
        step
    }
}

/// The part of the machine a sequence drives.
pub trait MotionPlant {
    /// No axis channel has steps pending.
    fn axes_idle(&self) -> bool;

    /// Start an absolute move of all axes [mm] at a 0–100 speed setting.
    fn begin_move(&mut self, x: f64, y: f64, z: f64, speed: u8) -> Result<(), AxisError>;

    /// Command the gripper angle [deg].
    fn set_gripper(&mut self, angle: f64);
}

/// Runs at most one [`Sequence`] at a time.
#[derive(Debug, Clone)]
pub struct Sequencer {
    active: Option<Sequence>,
    settle: Duration,
    /// Remaining servo settle time before the next step.
    settling: Option<Duration>,
}

impl Sequencer {
    pub fn new(settle: Duration) -> Self {
        Self {
            active: None,
            settle,
            settling: None,
        }
    }

    #[inline]
    pub const fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    #[inline]
    pub fn active(&self) -> Option<&Sequence> {
        self.active.as_ref()
    }

    /// Accept a sequence; refused while another one is in flight.
    pub fn enqueue(&mut self, sequence: Sequence) -> Result<(), CommandError> {
        if let Some(current) = &self.active {
            debug!(current = current.raw(), "sequencer busy");
            return Err(CommandError::rejected("busy", sequence.raw()));
        }
        debug!(raw = sequence.raw(), steps = sequence.steps().len(), "sequence accepted");
        self.active = Some(sequence);
        self.settling = None;
        Ok(())
    }

    /// Discard the remaining steps.
    ///
    /// Returns the abort report if the originating line is still waiting
    /// for its reply.
    pub fn abort(&mut self) -> Option<Reply> {
        self.settling = None;
        let sequence = self.active.take()?;
        info!(raw = sequence.raw(), remaining = sequence.remaining(), "sequence aborted");
        sequence
            .completion
            .as_ref()
            .map(|_| Reply::Error(CommandError::rejected("sequence aborted", sequence.raw())))
    }

    /// Advance by one tick. Returns the completion (or abort) reply when the
    /// sequence ends in this tick.
    pub fn tick<P: MotionPlant + ?Sized>(&mut self, dt: Duration, plant: &mut P) -> Option<Reply> {
        if self.active.is_none() {
            return None;
        }

        if let Some(left) = self.settling {
            match left.checked_sub(dt) {
                Some(rest) if !rest.is_zero() => {
                    self.settling = Some(rest);
                    return None;
                }
                _ => self.settling = None,
            }
        }

        if !plant.axes_idle() {
            return None;
        }

        let sequence = self.active.as_mut()?;
        match sequence.next_step() {
            Some(SequenceStep::MoveTo { x, y, z, speed }) => {
                debug!(x, y, z, speed, "sequence move");
                if plant.begin_move(x, y, z, speed).is_err() {
                    return self.abort();
                }
                None
            }
            Some(SequenceStep::Gripper { angle }) => {
                debug!(angle, "sequence gripper");
                plant.set_gripper(angle);
                self.settling = Some(self.settle);
                None
            }
            None => {
                let done = self.active.take()?;
                debug!(raw = done.raw(), "sequence complete");
                done.completion
            }
        }
    }
}
