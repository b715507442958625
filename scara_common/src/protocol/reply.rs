//! Reply and notification lines.

use std::fmt;
use std::str::FromStr;

use super::command::Verb;
use super::error::CommandError;

/// Prefix of status telemetry lines.
pub const STATUS_PREFIX: &str = "STATUS:";

/// Machine state summary sent for `T` and on every telemetry interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusReport {
    /// Position [mm].
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Gripper angle [deg].
    pub grip: f64,
    /// Speed setting (0–100).
    pub speed: u8,
}

/// Round to `places` decimals, folding anything that rounds to zero onto
/// positive zero so no field prints as "-0.00".
fn tidy(v: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    let r = (v * scale).round() / scale;
    if r == 0.0 { 0.0 } else { r }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{STATUS_PREFIX}{:.2},{:.2},{:.2},{:.1},{}",
            tidy(self.x, 2),
            tidy(self.y, 2),
            tidy(self.z, 2),
            tidy(self.grip, 1),
            self.speed
        )
    }
}

impl FromStr for StatusReport {
    type Err = CommandError;

    /// Parse a `STATUS:` line as the host does.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let body = line
            .trim()
            .strip_prefix(STATUS_PREFIX)
            .ok_or_else(|| CommandError::protocol("missing STATUS prefix", line))?;
        let fields: Vec<&str> = body.split(',').collect();
        if fields.len() != 5 {
            return Err(CommandError::protocol("expected 5 status fields", line));
        }
        let num = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| CommandError::protocol("invalid status number", line))
        };
        Ok(Self {
            x: num(fields[0])?,
            y: num(fields[1])?,
            z: num(fields[2])?,
            grip: num(fields[3])?,
            speed: fields[4]
                .parse::<u8>()
                .map_err(|_| CommandError::protocol("invalid status speed", line))?,
        })
    }
}

/// One outbound protocol line.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Command accepted (or composite sequence completed).
    Ok,
    /// `STATUS:x,y,z,grip,speed`.
    Status(StatusReport),
    /// `HELP:` list of verbs.
    Help,
    /// Reply to `E`, or notification of an asserted stop input.
    EmergencyStop,
    /// Notification of a tripped limit sensor.
    LimitSwitchTriggered,
    /// `ERROR:<reason>:<raw>`.
    Error(CommandError),
}

impl Reply {
    /// Whether this line is data rather than an acknowledgement.
    pub const fn is_status(&self) -> bool {
        matches!(self, Reply::Status(_))
    }

    /// Whether this line is an error reply.
    pub const fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(err)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => f.write_str("OK"),
            Reply::Status(report) => fmt::Display::fmt(report, f),
            Reply::Help => {
                f.write_str("HELP:")?;
                for (i, verb) in Verb::ALL.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", verb.as_char())?;
                }
                Ok(())
            }
            Reply::EmergencyStop => f.write_str("EMERGENCY_STOP"),
            Reply::LimitSwitchTriggered => f.write_str("LIMIT_SWITCH_TRIGGERED"),
            Reply::Error(err) => write!(f, "ERROR:{}:{}", err.reason, err.raw),
        }
    }
}
