//! # SCARA Controller Library
//!
//! Controller-side motion engine for a three-axis SCARA arm driven by stepper
//! motors and a servo gripper. A host sends one ASCII command per line over a
//! serial link; the controller turns it into non-blocking trapezoidal stepper
//! motion while watching the limit sensors and the emergency-stop input.
//!
//! ## Tick Order
//!
//! Everything runs inside [`controller::Controller::tick`], single-threaded:
//!
//! 1. **Command** - at most one input line is parsed and dispatched
//! 2. **Safety** - interlock inputs are polled; a trip halts and latches
//! 3. **Axes** - each channel emits at most one step
//! 4. **Sequencer** - composite moves advance; gripper writes are flushed
//! 5. **Telemetry** - `STATUS:` lines on a fixed interval
//!
//! No step of a tick blocks. The serial reader thread is the only other
//! thread and shares nothing but a channel with the loop.

pub mod axis;
pub mod command;
pub mod controller;
pub mod cycle;
pub mod error;
pub mod gripper;
pub mod hal;
pub mod link;
pub mod safety;
pub mod sequencer;
pub mod state;
pub mod status;
pub mod vision;
