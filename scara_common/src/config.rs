//! Configuration loading traits and types.
//!
//! This module provides the standard way to load the controller's TOML
//! configuration. Workspace bounds, serial settings and mechanical constants
//! are read once at startup and stay immutable for the process lifetime.
//!
//! # Usage
//!
//! ```rust,no_run
//! use scara_common::config::{ConfigError, ConfigLoader, ControllerConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = ControllerConfig::load(Path::new("controller.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::consts::{
    CYCLE_TIME_US, GRIPPER_MAX_DEG, GRIPPER_MIN_DEG, PERCENT_MAX, SUPPORTED_BAUD_RATES,
};
use crate::hal::Axis;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, per-step tracing.
    Trace,
    /// Per-command debugging.
    Debug,
    /// State transitions and startup.
    #[default]
    Info,
    /// Interlock trips, rejected commands, overruns.
    Warn,
    /// Fatal conditions only.
    Error,
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "scara-bench-01"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Controller instance identifier.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            service_name: "scara-controller".to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

// ─── Serial Link ────────────────────────────────────────────────────

/// Serial link settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path; `-` selects stdin/stdout.
    pub port: String,
    /// Line rate applied to the device when it is a terminal.
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
        }
    }
}

// ─── Mechanics ──────────────────────────────────────────────────────

/// Fixed mechanical ratio between motor steps and linear travel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MechanicsConfig {
    /// Full steps per motor revolution.
    pub steps_per_rev: u32,
    /// Driver microstep factor.
    pub microsteps: u32,
    /// Linear travel per revolution [mm].
    pub mm_per_rev: f64,
}

impl Default for MechanicsConfig {
    fn default() -> Self {
        Self {
            steps_per_rev: 200,
            microsteps: 16,
            mm_per_rev: 8.0,
        }
    }
}

// ─── Workspace ──────────────────────────────────────────────────────

/// Rectangular volume every commanded position must lie in [mm].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkspaceBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl Default for WorkspaceBounds {
    fn default() -> Self {
        Self {
            x_min: -200.0,
            x_max: 200.0,
            y_min: -200.0,
            y_max: 200.0,
            z_min: 0.0,
            z_max: 100.0,
        }
    }
}

impl WorkspaceBounds {
    /// Inclusive `(min, max)` range for one axis.
    #[inline]
    pub const fn range(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::X => (self.x_min, self.x_max),
            Axis::Y => (self.y_min, self.y_max),
            Axis::Z => (self.z_min, self.z_max),
        }
    }

    /// Whether `value` lies inside the range of `axis`.
    #[inline]
    pub fn axis_contains(&self, axis: Axis, value: f64) -> bool {
        let (min, max) = self.range(axis);
        value >= min && value <= max
    }

    /// Whether the XY pair lies inside the workspace footprint.
    pub fn contains_xy(&self, x: f64, y: f64) -> bool {
        self.axis_contains(Axis::X, x) && self.axis_contains(Axis::Y, y)
    }

    /// Whether the point lies inside the workspace volume.
    pub fn contains(&self, x: f64, y: f64, z: f64) -> bool {
        self.contains_xy(x, y) && self.axis_contains(Axis::Z, z)
    }
}

// ─── Motion ─────────────────────────────────────────────────────────

/// Stepper speed limits and the mapping from the host's 0–100 scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotionConfig {
    /// Step rate at speed 100 [steps/s].
    pub max_speed_steps: f64,
    /// Acceleration at accel 100 [steps/s²].
    pub max_accel_steps: f64,
    /// Floor so that speed 0 never stalls a move [steps/s].
    pub min_speed_steps: f64,
    /// Floor so that accel 0 never stalls a move [steps/s²].
    pub min_accel_steps: f64,
    /// Power-on speed setting (0–100).
    pub default_speed: u8,
    /// Power-on acceleration setting (0–100).
    pub default_accel: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_speed_steps: 4000.0,
            max_accel_steps: 8000.0,
            min_speed_steps: 100.0,
            min_accel_steps: 200.0,
            default_speed: 100,
            default_accel: 50,
        }
    }
}

impl MotionConfig {
    /// Map a 0–100 speed setting onto a step rate.
    pub fn speed_steps(&self, percent: u8) -> f64 {
        scale_percent(percent, self.max_speed_steps).max(self.min_speed_steps)
    }

    /// Map a 0–100 acceleration setting onto steps/s².
    pub fn accel_steps(&self, percent: u8) -> f64 {
        scale_percent(percent, self.max_accel_steps).max(self.min_accel_steps)
    }
}

fn scale_percent(percent: u8, max: f64) -> f64 {
    f64::from(percent.min(PERCENT_MAX)) / f64::from(PERCENT_MAX) * max
}

// ─── Gripper ────────────────────────────────────────────────────────

/// Servo gripper angles and timing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GripperConfig {
    /// Angle written at startup [deg].
    pub initial_angle: f64,
    /// Angle used by the place sequence [deg].
    pub open_angle: f64,
    /// Angle used by the pick sequence [deg].
    pub closed_angle: f64,
    /// Time a sequence waits after a gripper write [ms].
    pub settle_ms: u64,
}

impl Default for GripperConfig {
    fn default() -> Self {
        Self {
            initial_angle: 0.0,
            open_angle: 90.0,
            closed_angle: 10.0,
            settle_ms: 250,
        }
    }
}

// ─── Composite Sequences ────────────────────────────────────────────

/// Parameters of the pick / place expansions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SequenceConfig {
    /// Travel height above the work surface [mm].
    pub safe_height: f64,
    /// Speed for moves at safe height (0–100).
    pub fast_speed: u8,
    /// Speed for the descent to the surface (0–100).
    pub slow_speed: u8,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            safe_height: 50.0,
            fast_speed: 80,
            slow_speed: 20,
        }
    }
}

// ─── Telemetry & Cycle ──────────────────────────────────────────────

/// Unsolicited status telemetry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusConfig {
    /// Publication period [ms].
    pub interval_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

/// Control loop pacing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CycleConfig {
    /// Tick period [µs].
    pub cycle_time_us: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: CYCLE_TIME_US,
        }
    }
}

// ─── Vision ─────────────────────────────────────────────────────────

/// A known object location reported by the vision pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisionObject {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Object-to-coordinate resolution seed data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisionConfig {
    /// Coordinate used for ids the table does not know. Placeholder only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<[f64; 2]>,
    /// Objects known at startup.
    pub objects: Vec<VisionObject>,
}

// ─── Controller Config ──────────────────────────────────────────────

/// Complete controller configuration.
///
/// Every section is optional in the file; missing sections take their
/// defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub shared: SharedConfig,
    pub serial: SerialConfig,
    pub mechanics: MechanicsConfig,
    pub workspace: WorkspaceBounds,
    pub motion: MotionConfig,
    pub gripper: GripperConfig,
    pub sequence: SequenceConfig,
    pub status: StatusConfig,
    pub cycle: CycleConfig,
    pub vision: VisionConfig,
}

impl ControllerConfig {
    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(ConfigError::ValidationError(format!(
                "serial: unsupported baud_rate {}",
                self.serial.baud_rate
            )));
        }

        let m = &self.mechanics;
        if m.steps_per_rev == 0 || m.microsteps == 0 {
            return Err(invalid("mechanics: steps_per_rev and microsteps must be > 0"));
        }
        if !(m.mm_per_rev.is_finite() && m.mm_per_rev > 0.0) {
            return Err(invalid("mechanics: mm_per_rev must be a positive number"));
        }

        for axis in Axis::ALL {
            let (min, max) = self.workspace.range(axis);
            if !(min.is_finite() && max.is_finite() && min < max) {
                return Err(ConfigError::ValidationError(format!(
                    "workspace: {axis} range [{min}, {max}] is empty or not finite"
                )));
            }
        }

        let mo = &self.motion;
        if !(mo.min_speed_steps > 0.0 && mo.min_speed_steps <= mo.max_speed_steps) {
            return Err(invalid("motion: need 0 < min_speed_steps <= max_speed_steps"));
        }
        if !(mo.min_accel_steps > 0.0 && mo.min_accel_steps <= mo.max_accel_steps) {
            return Err(invalid("motion: need 0 < min_accel_steps <= max_accel_steps"));
        }
        if mo.default_speed > PERCENT_MAX || mo.default_accel > PERCENT_MAX {
            return Err(invalid("motion: default speed/accel must be 0-100"));
        }

        if self.cycle.cycle_time_us == 0 {
            return Err(invalid("cycle: cycle_time_us must be > 0"));
        }
        // One tick may emit at most one step per axis.
        let steps_per_tick = mo.max_speed_steps * self.cycle.cycle_time_us as f64 / 1_000_000.0;
        if steps_per_tick > 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "motion: max_speed_steps {} needs {steps_per_tick:.2} steps per {}µs tick (max 1)",
                mo.max_speed_steps, self.cycle.cycle_time_us
            )));
        }

        let g = &self.gripper;
        for (name, angle) in [
            ("initial_angle", g.initial_angle),
            ("open_angle", g.open_angle),
            ("closed_angle", g.closed_angle),
        ] {
            if !(GRIPPER_MIN_DEG..=GRIPPER_MAX_DEG).contains(&angle) {
                return Err(ConfigError::ValidationError(format!(
                    "gripper: {name} {angle} outside 0-180"
                )));
            }
        }

        let s = &self.sequence;
        if !self.workspace.axis_contains(Axis::Z, s.safe_height) {
            return Err(invalid("sequence: safe_height outside the Z workspace range"));
        }
        if !self.workspace.axis_contains(Axis::Z, 0.0) {
            return Err(invalid("sequence: pick/place surface z=0 outside the Z workspace range"));
        }
        if s.fast_speed > PERCENT_MAX || s.slow_speed > PERCENT_MAX {
            return Err(invalid("sequence: speeds must be 0-100"));
        }

        if self.status.interval_ms == 0 {
            return Err(invalid("status: interval_ms must be > 0"));
        }

        for obj in &self.vision.objects {
            if !self.workspace.contains_xy(obj.x, obj.y) {
                return Err(ConfigError::ValidationError(format!(
                    "vision: object '{}' at ({}, {}) outside the workspace",
                    obj.id, obj.x, obj.y
                )));
            }
        }
        if let Some([x, y]) = self.vision.fallback {
            if !self.workspace.contains_xy(x, y) {
                return Err(invalid("vision: fallback coordinate outside the workspace"));
            }
        }

        Ok(())
    }

    /// Render the configuration as TOML (used by `--print-config`).
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::ValidationError(msg.to_string())
}
