//! The controller: owns all motion state and runs one tick at a time.
//!
//! ## Tick Order
//!
//! 1. Take at most one complete input line, parse and dispatch it. A
//!    received `E` jumps the queue and is taken first
//! 2. Poll the interlock inputs; a trip halts and latches
//! 3. Advance each axis channel by at most one step, forwarding it to the HAL
//! 4. Advance the sequencer, then flush a pending gripper write
//! 5. Emit `STATUS:` when the telemetry interval has elapsed
//!
//! All mutation happens inside [`Controller::tick`]; nothing here blocks.

use std::time::Duration;

use scara_common::config::{ConfigError, ControllerConfig, MotionConfig};
use scara_common::consts::{AXIS_COUNT, MAX_QUEUED_LINES};
use scara_common::hal::{Axis, MotionHal};
use scara_common::protocol::{Command, CommandError, Reply};
use scara_common::units::UnitConverter;
use tracing::{info, trace, warn};

use crate::axis::AxisMotionChannel;
use crate::command::parser::CommandParser;
use crate::error::AxisError;
use crate::gripper::GripperChannel;
use crate::link::LineBuffer;
use crate::safety::{InterlockState, SafetyMonitor};
use crate::sequencer::{MotionPlant, SequenceParams, Sequencer};
use crate::state::RobotState;
use crate::status::StatusPublisher;
use crate::vision::ObjectTable;

// ─── Motion Stage ───────────────────────────────────────────────────

/// Axis channels, gripper and the mapping from host units to steps.
#[derive(Debug, Clone)]
pub struct MotionStage {
    axes: [AxisMotionChannel; AXIS_COUNT],
    gripper: GripperChannel,
    units: UnitConverter,
    limits: MotionConfig,
}

impl MotionStage {
    pub fn new(config: &ControllerConfig) -> Self {
        let limits = config.motion;
        let speed = limits.speed_steps(limits.default_speed);
        let accel = limits.accel_steps(limits.default_accel);
        Self {
            axes: Axis::ALL.map(|axis| AxisMotionChannel::new(axis, speed, accel)),
            gripper: GripperChannel::new(config.gripper.initial_angle),
            units: UnitConverter::new(&config.mechanics),
            limits,
        }
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisMotionChannel {
        &self.axes[axis.index()]
    }

    #[inline]
    pub const fn gripper(&self) -> &GripperChannel {
        &self.gripper
    }

    #[inline]
    pub const fn units(&self) -> &UnitConverter {
        &self.units
    }

    /// Whether any channel has steps pending.
    pub fn any_active(&self) -> bool {
        self.axes.iter().any(AxisMotionChannel::is_active)
    }

    /// Step-derived position of `axis` [mm].
    pub fn physical_mm(&self, axis: Axis) -> f64 {
        self.units.to_mm(self.axis(axis).position())
    }

    /// Start a single-axis move to `mm` at a 0–100 speed setting.
    pub fn move_axis(&mut self, axis: Axis, mm: f64, speed: u8) -> Result<(), AxisError> {
        let steps = self.units.to_steps(mm);
        let channel = &mut self.axes[axis.index()];
        channel.move_to(steps)?;
        channel.set_max_speed(self.limits.speed_steps(speed));
        Ok(())
    }

    /// Apply a 0–100 acceleration setting to every channel.
    pub fn set_accel_percent(&mut self, percent: u8) {
        let accel = self.limits.accel_steps(percent);
        for channel in &mut self.axes {
            channel.set_acceleration(accel);
        }
    }

    pub fn set_gripper(&mut self, angle: f64) {
        self.gripper.set(angle);
    }

    /// Stop every channel and refuse targets until released.
    pub fn inhibit_all(&mut self) {
        for channel in &mut self.axes {
            channel.inhibit();
        }
    }

    pub fn release_all(&mut self) {
        for channel in &mut self.axes {
            channel.release();
        }
    }

    /// Advance every channel one tick and forward the steps to the HAL.
    fn tick<H: MotionHal + ?Sized>(&mut self, dt: f64, hal: &mut H) {
        for channel in &mut self.axes {
            if let Some(direction) = channel.tick(dt) {
                hal.step(channel.axis(), direction);
            }
        }
    }
}

impl MotionPlant for MotionStage {
    fn axes_idle(&self) -> bool {
        !self.any_active()
    }

    fn begin_move(&mut self, x: f64, y: f64, z: f64, speed: u8) -> Result<(), AxisError> {
        for (axis, mm) in [(Axis::X, x), (Axis::Y, y), (Axis::Z, z)] {
            self.move_axis(axis, mm, speed)?;
        }
        Ok(())
    }

    fn set_gripper(&mut self, angle: f64) {
        MotionStage::set_gripper(self, angle);
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Motion control and command protocol engine.
#[derive(Debug)]
pub struct Controller {
    pub(crate) parser: CommandParser,
    pub(crate) state: RobotState,
    pub(crate) motion: MotionStage,
    pub(crate) sequencer: Sequencer,
    pub(crate) monitor: SafetyMonitor,
    pub(crate) objects: ObjectTable,
    pub(crate) params: SequenceParams,
    publisher: StatusPublisher,
    lines: LineBuffer,
    inbox: heapless::Deque<Result<String, CommandError>, MAX_QUEUED_LINES>,
    /// `E` lines received but not yet dispatched.
    pending_stops: usize,
}

impl Controller {
    /// Build from a configuration; the configuration is validated first.
    pub fn new(config: &ControllerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let objects = ObjectTable::from_config(&config.vision, &config.workspace)
            .map_err(|e| ConfigError::ValidationError(format!("vision: {e}")))?;

        let params = SequenceParams::new(&config.sequence, &config.gripper);
        info!(
            steps_per_mm = UnitConverter::new(&config.mechanics).steps_per_mm(),
            objects = objects.len(),
            "controller initialised"
        );

        Ok(Self {
            parser: CommandParser::new(config.workspace),
            state: RobotState::new(config),
            motion: MotionStage::new(config),
            sequencer: Sequencer::new(params.settle),
            monitor: SafetyMonitor::new(),
            objects,
            params,
            publisher: StatusPublisher::new(Duration::from_millis(config.status.interval_ms)),
            lines: LineBuffer::new(),
            inbox: heapless::Deque::new(),
            pending_stops: 0,
        })
    }

    #[inline]
    pub const fn state(&self) -> &RobotState {
        &self.state
    }

    #[inline]
    pub const fn motion(&self) -> &MotionStage {
        &self.motion
    }

    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisMotionChannel {
        self.motion.axis(axis)
    }

    #[inline]
    pub const fn interlock(&self) -> InterlockState {
        self.monitor.state()
    }

    #[inline]
    pub const fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    #[inline]
    pub const fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    /// Complete lines waiting for dispatch.
    #[inline]
    pub fn queued_lines(&self) -> usize {
        self.inbox.len() + self.pending_stops
    }

    /// No queued input, no motion, no sequence.
    pub fn is_idle(&self) -> bool {
        self.queued_lines() == 0 && !self.motion.any_active() && !self.sequencer.is_busy()
    }

    /// Feed raw bytes from the link.
    ///
    /// An emergency stop line is set aside to be dispatched ahead of the
    /// queue. A line arriving while the queue is full is refused at once
    /// with `input overflow`.
    pub fn feed(&mut self, bytes: &[u8], out: &mut Vec<Reply>) {
        for &byte in bytes {
            let Some(input) = self.lines.push(byte) else {
                continue;
            };
            if let Ok(line) = &input {
                if matches!(self.parser.parse(line), Ok(Command::EmergencyStop)) {
                    self.pending_stops += 1;
                    continue;
                }
            }
            if let Err(refused) = self.inbox.push_back(input) {
                let raw = match &refused {
                    Ok(line) => line.trim(),
                    Err(err) => err.raw.as_str(),
                };
                warn!(raw, queued = self.inbox.len(), "input queue full");
                out.push(Reply::Error(CommandError::protocol("input overflow", raw)));
            }
        }
    }

    /// The link has closed; report a trailing line that never got its
    /// terminator.
    pub fn close_input(&mut self, out: &mut Vec<Reply>) {
        if let Some(err) = self.lines.finish() {
            warn!(%err, "input closed mid-line");
            out.push(Reply::Error(err));
        }
    }

    /// Run one control cycle. Replies and notifications are appended to `out`.
    pub fn tick<H: MotionHal + ?Sized>(&mut self, dt: Duration, hal: &mut H, out: &mut Vec<Reply>) {
        // 1. Command
        if self.pending_stops > 0 {
            self.pending_stops -= 1;
            self.dispatch(Command::EmergencyStop, "E", hal, out);
        } else if let Some(input) = self.inbox.pop_front() {
            match input {
                Ok(line) => self.dispatch_line(&line, hal, out),
                Err(err) => {
                    warn!(%err, "input rejected");
                    out.push(Reply::Error(err));
                }
            }
        }

        // 2. Safety
        if let Some(cause) = self.monitor.check(hal.read_inputs()) {
            out.push(cause.notification());
            self.halt(out);
        }

        // 3. Axes
        self.motion.tick(dt.as_secs_f64(), hal);

        // 4. Sequencer
        if let Some(reply) = self.sequencer.tick(dt, &mut self.motion) {
            out.push(reply);
        }
        if let Some(angle) = self.motion.gripper.take_pending() {
            trace!(angle, "gripper write");
            hal.set_gripper(angle);
        }
        self.state.grip = self.motion.gripper.angle();
        let moving = self.motion.any_active() || self.sequencer.is_busy();
        self.state.is_moving = moving;
        self.monitor.update_motion(moving);

        // 5. Telemetry
        if self.publisher.tick(dt) {
            out.push(Reply::Status(self.state.status_report()));
        }
    }

    /// Stop everything, latch, and abort the active sequence.
    ///
    /// The recorded position snaps to where the axes actually stopped.
    pub(crate) fn halt(&mut self, out: &mut Vec<Reply>) {
        self.motion.inhibit_all();
        for axis in Axis::ALL {
            self.state.set_position(axis, self.motion.physical_mm(axis));
        }
        self.state.emergency_stop = true;
        self.state.is_moving = false;
        if let Some(reply) = self.sequencer.abort() {
            out.push(reply);
        }
        warn!(
            x = self.state.x,
            y = self.state.y,
            z = self.state.z,
            "motion halted, emergency latch set"
        );
    }
}
