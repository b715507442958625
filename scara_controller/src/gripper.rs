//! Gripper servo channel.
//!
//! Holds the commanded angle and a pending write that the tick flushes to
//! the HAL after the sequencer has run.

/// Servo gripper actuator state.
#[derive(Debug, Clone)]
pub struct GripperChannel {
    angle: f64,
    pending: Option<f64>,
}

impl GripperChannel {
    /// Start at `initial_angle`; the first tick writes it out.
    pub fn new(initial_angle: f64) -> Self {
        Self {
            angle: initial_angle,
            pending: Some(initial_angle),
        }
    }

    /// Last commanded angle [deg].
    #[inline]
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Command a new angle. The value is range-checked by the parser.
    pub fn set(&mut self, angle_deg: f64) {
        self.angle = angle_deg;
        self.pending = Some(angle_deg);
    }

    /// Take the write that has not reached the HAL yet.
    pub fn take_pending(&mut self) -> Option<f64> {
        self.pending.take()
    }
}
