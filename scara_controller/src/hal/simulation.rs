//! Simulated motion hardware.
//!
//! Counts steps per axis, remembers the last gripper write and lets tests
//! (or the operator) assert limit sensors and the stop input. With travel
//! limits enabled, a step that leaves the configured range closes the
//! matching limit switch for the next poll, the way a carriage passing its
//! end switch would.

use scara_common::config::WorkspaceBounds;
use scara_common::consts::AXIS_COUNT;
use scara_common::hal::{Axis, Direction, LimitSwitches, MotionHal, SensorSnapshot};
use scara_common::units::UnitConverter;
use tracing::{debug, warn};

/// Software stand-in for the stepper drivers, servo and sensors.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHal {
    steps: [i64; AXIS_COUNT],
    step_count: u64,
    gripper: Option<f64>,
    /// Sensors asserted from outside.
    limits: LimitSwitches,
    estop: bool,
    /// Allowed step range per axis.
    travel: Option<[(i64, i64); AXIS_COUNT]>,
    /// Switches closed by travel overruns, cleared on the next poll.
    overrun: LimitSwitches,
}

impl SimulatedHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable travel-limit trips at the workspace edges.
    pub fn with_travel(mut self, bounds: &WorkspaceBounds, units: &UnitConverter) -> Self {
        let mut travel = [(0, 0); AXIS_COUNT];
        for axis in Axis::ALL {
            let (min, max) = bounds.range(axis);
            travel[axis.index()] = (units.to_steps(min), units.to_steps(max));
        }
        debug!(?travel, "simulated travel limits");
        self.travel = Some(travel);
        self
    }

    /// Step position of `axis`.
    #[inline]
    pub fn position(&self, axis: Axis) -> i64 {
        self.steps[axis.index()]
    }

    /// Steps emitted on all axes since start.
    #[inline]
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Last gripper write.
    #[inline]
    pub const fn gripper(&self) -> Option<f64> {
        self.gripper
    }

    /// Assert or release limit sensors.
    pub fn set_limits(&mut self, limits: LimitSwitches) {
        self.limits = limits;
    }

    /// Assert or release the stop input.
    pub fn set_estop(&mut self, asserted: bool) {
        self.estop = asserted;
    }
}

impl MotionHal for SimulatedHal {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn read_inputs(&mut self) -> SensorSnapshot {
        let limits = self.limits | self.overrun;
        self.overrun = LimitSwitches::empty();
        SensorSnapshot {
            limits,
            estop: self.estop,
        }
    }

    fn step(&mut self, axis: Axis, direction: Direction) {
        let pos = &mut self.steps[axis.index()];
        *pos += direction.sign();
        self.step_count += 1;

        if let Some(travel) = self.travel {
            let (min, max) = travel[axis.index()];
            if *pos < min {
                warn!(%axis, position = *pos, "simulated axis passed its min switch");
                self.overrun |= axis.min_limit();
            } else if *pos > max {
                warn!(%axis, position = *pos, "simulated axis passed its max switch");
                self.overrun |= axis.max_limit();
            }
        }
    }

    fn set_gripper(&mut self, angle_deg: f64) {
        self.gripper = Some(angle_deg);
    }
}
