//! Robot state as seen by the host.
//!
//! Positions here are the *commanded* location: updated when a move is
//! accepted, not when it finishes. On a halt they are reconciled to the
//! step-derived position so status and relative moves match where the arm
//! actually stopped.

use scara_common::config::ControllerConfig;
use scara_common::hal::Axis;
use scara_common::protocol::StatusReport;

/// Single-writer state owned by the control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotState {
    /// Commanded position [mm].
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Gripper angle [deg].
    pub grip: f64,
    /// Default speed setting (0–100).
    pub speed: u8,
    /// Default acceleration setting (0–100).
    pub accel: u8,
    /// Any axis active or a sequence busy (derived each tick).
    pub is_moving: bool,
    /// Emergency latch.
    pub emergency_stop: bool,
}

impl RobotState {
    /// Power-on state at the origin.
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            grip: config.gripper.initial_angle,
            speed: config.motion.default_speed,
            accel: config.motion.default_accel,
            is_moving: false,
            emergency_stop: false,
        }
    }

    /// Commanded coordinate of `axis` [mm].
    #[inline]
    pub const fn position(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    #[inline]
    pub fn set_position(&mut self, axis: Axis, mm: f64) {
        match axis {
            Axis::X => self.x = mm,
            Axis::Y => self.y = mm,
            Axis::Z => self.z = mm,
        }
    }

    /// Snapshot for a `STATUS:` line.
    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            x: self.x,
            y: self.y,
            z: self.z,
            grip: self.grip,
            speed: self.speed,
        }
    }
}
