//! System-wide constants for the SCARA workspace.
//!
//! Single source of truth for all numeric limits and default paths.
//! Imported by all crates; never duplicated locally.

use static_assertions::const_assert;

/// Number of independently driven axes (X, Y, Z).
pub const AXIS_COUNT: usize = 3;

/// Maximum length of one protocol line, terminator excluded.
pub const MAX_LINE_LEN: usize = 128;

/// Complete input lines buffered ahead of dispatch.
pub const MAX_QUEUED_LINES: usize = 32;

/// Maximum length of a vision object identifier.
pub const MAX_OBJECT_ID_LEN: usize = 32;

/// Maximum number of entries in the vision object table.
pub const MAX_VISION_OBJECTS: usize = 32;

/// Lowest valid gripper angle [deg].
pub const GRIPPER_MIN_DEG: f64 = 0.0;

/// Highest valid gripper angle [deg].
pub const GRIPPER_MAX_DEG: f64 = 180.0;

/// Upper bound of the host-facing speed / acceleration scale.
pub const PERCENT_MAX: u8 = 100;

/// Line rates the serial link can be set to.
pub const SUPPORTED_BAUD_RATES: [u32; 11] = [
    1_200, 2_400, 4_800, 9_600, 19_200, 38_400, 57_600, 115_200, 230_400, 460_800, 921_600,
];

/// Default system cycle time in microseconds.
pub const CYCLE_TIME_US: u64 = 200;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/scara/controller.toml";

// A full X command with four maximal floats must fit in one line.
const_assert!(MAX_LINE_LEN >= 64);
const_assert!(MAX_OBJECT_ID_LEN < MAX_LINE_LEN);
const_assert!(MAX_QUEUED_LINES >= 2);
