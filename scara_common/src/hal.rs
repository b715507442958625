//! Hardware abstraction contract.
//!
//! The control loop talks to step outputs, the gripper servo and the
//! interlock inputs only through [`driver::MotionHal`], so the same core runs
//! against real drivers or the simulation.

pub mod driver;
pub mod types;

pub use driver::MotionHal;
pub use types::{Axis, Direction, LimitSwitches, SensorSnapshot};
