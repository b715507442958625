//! HAL drivers available to the controller binary.
//!
//! Only the simulation lives here; hardware drivers implement
//! [`scara_common::hal::MotionHal`] in their own crates.

pub mod simulation;

pub use simulation::SimulatedHal;
