//! HAL driver trait.
//!
//! # Timing Contracts
//!
//! Every method is called from inside the control tick and must return
//! immediately: no sleeping, no blocking I/O.
//!
//! | Operation | Called | RT Constraint |
//! |-----------|--------|---------------|
//! | `read_inputs()` | once per tick, before motion | **HARD** |
//! | `step()` | at most once per axis per tick | **HARD** |
//! | `set_gripper()` | on gripper writes | **HARD** |

use crate::hal::types::{Axis, Direction, SensorSnapshot};

/// Interface between the control loop and the physical machine.
pub trait MotionHal {
    /// Returns the driver's identifier (e.g. "simulation").
    fn name(&self) -> &'static str;

    /// Poll the six limit sensors and the emergency-stop input.
    fn read_inputs(&mut self) -> SensorSnapshot;

    /// Pulse one step on `axis` in `direction`.
    fn step(&mut self, axis: Axis, direction: Direction);

    /// Command the gripper servo to `angle_deg`.
    fn set_gripper(&mut self, angle_deg: f64);
}
