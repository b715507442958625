//! Prelude module for common re-exports.
//!
//! ```rust
//! use scara_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, ControllerConfig, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_COUNT, CYCLE_TIME_US, MAX_LINE_LEN};

// ─── HAL ────────────────────────────────────────────────────────────
pub use crate::hal::{Axis, Direction, LimitSwitches, MotionHal, SensorSnapshot};

// ─── Protocol ───────────────────────────────────────────────────────
pub use crate::protocol::{Command, CommandError, ErrorKind, Reply, StatusReport};

// ─── Units ──────────────────────────────────────────────────────────
pub use crate::units::UnitConverter;
