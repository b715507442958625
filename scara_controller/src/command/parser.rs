//! Line → [`Command`] parser.
//!
//! Grammar: `<VERB>:<p1>,<p2>,...` for verbs with parameters, the bare verb
//! for `H`, `T`, `E`, `R` and `?`. Whitespace around each parameter is
//! ignored. Values are validated completely before a command is returned;
//! anything out of range is rejected, never clamped.
//!
//! Relative `Y`/`Z` distances are not bounds-checked here because the
//! resulting target depends on the current position.

use scara_common::config::WorkspaceBounds;
use scara_common::consts::{GRIPPER_MAX_DEG, GRIPPER_MIN_DEG, PERCENT_MAX};
use scara_common::hal::Axis;
use scara_common::protocol::{Command, CommandError, Verb};

use crate::vision::object_id;

/// Stateless parser bound to the configured workspace.
#[derive(Debug, Clone)]
pub struct CommandParser {
    bounds: WorkspaceBounds,
}

impl CommandParser {
    pub fn new(bounds: WorkspaceBounds) -> Self {
        Self { bounds }
    }

    #[inline]
    pub const fn bounds(&self) -> &WorkspaceBounds {
        &self.bounds
    }

    /// Parse one line. The terminator may or may not be present.
    pub fn parse(&self, line: &str) -> Result<Command, CommandError> {
        let raw = line.trim();
        let mut chars = raw.chars();
        let Some(first) = chars.next() else {
            return Err(CommandError::protocol("empty line", raw));
        };
        let Some(verb) = Verb::from_char(first) else {
            return Err(CommandError::protocol("unknown command", raw));
        };
        let rest = chars.as_str();

        let arity = verb.arity();
        if arity == 0 {
            if !rest.is_empty() {
                return Err(CommandError::protocol("command takes no parameters", raw));
            }
            return Ok(match verb {
                Verb::Home => Command::Home,
                Verb::Status => Command::Status,
                Verb::EmergencyStop => Command::EmergencyStop,
                Verb::Reset => Command::Reset,
                _ => Command::Help,
            });
        }

        let Some(body) = rest.strip_prefix(':') else {
            return Err(CommandError::protocol("missing colon after verb", raw));
        };
        let params: Vec<&str> = body.split(',').map(str::trim).collect();
        if params.len() != arity {
            return Err(CommandError::protocol(
                format!("expected {arity} parameters, got {}", params.len()),
                raw,
            ));
        }

        let p = Params { raw, values: &params };
        match verb {
            Verb::MoveTo => {
                let (x, y, z) = (p.float(0)?, p.float(1)?, p.float(2)?);
                let speed = p.percent(3, "speed")?;
                if !self.bounds.contains(x, y, z) {
                    return Err(CommandError::range("target outside workspace", raw));
                }
                Ok(Command::MoveTo { x, y, z, speed })
            }
            Verb::MoveY | Verb::MoveZ => {
                let axis = if verb == Verb::MoveY { Axis::Y } else { Axis::Z };
                Ok(Command::MoveRelative {
                    axis,
                    distance: p.float(0)?,
                })
            }
            Verb::Gripper => {
                let angle = p.float(0)?;
                if !(GRIPPER_MIN_DEG..=GRIPPER_MAX_DEG).contains(&angle) {
                    return Err(CommandError::range("gripper angle outside 0-180", raw));
                }
                Ok(Command::Gripper { angle })
            }
            Verb::SetSpeed => Ok(Command::SetSpeed(p.percent(0, "speed")?)),
            Verb::SetAccel => Ok(Command::SetAccel(p.percent(0, "acceleration")?)),
            Verb::Pick | Verb::Place => {
                let (x, y) = (p.float(0)?, p.float(1)?);
                if !self.bounds.contains_xy(x, y) {
                    return Err(CommandError::range("target outside workspace", raw));
                }
                Ok(if verb == Verb::Pick {
                    Command::Pick { x, y }
                } else {
                    Command::Place { x, y }
                })
            }
            Verb::VisionPick => Ok(Command::VisionPick {
                object: p.object(0)?,
            }),
            Verb::ReportObject => {
                let object = p.object(0)?;
                let (x, y) = (p.float(1)?, p.float(2)?);
                if !self.bounds.contains_xy(x, y) {
                    return Err(CommandError::range("object outside workspace", raw));
                }
                Ok(Command::ReportObject { object, x, y })
            }
            Verb::Home | Verb::Status | Verb::EmergencyStop | Verb::Reset | Verb::Help => {
                Err(CommandError::protocol("command takes no parameters", raw))
            }
        }
    }
}

/// Split parameters with the raw line kept for error replies.
struct Params<'a> {
    raw: &'a str,
    values: &'a [&'a str],
}

impl Params<'_> {
    fn float(&self, i: usize) -> Result<f64, CommandError> {
        match self.values[i].parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(CommandError::protocol(
                format!("invalid number '{}'", self.values[i]),
                self.raw,
            )),
        }
    }

    fn percent(&self, i: usize, what: &str) -> Result<u8, CommandError> {
        match self.values[i].parse::<i64>() {
            Ok(v) if (0..=i64::from(PERCENT_MAX)).contains(&v) => Ok(v as u8),
            Ok(_) => Err(CommandError::range(format!("{what} outside 0-100"), self.raw)),
            Err(_) => Err(CommandError::protocol(
                format!("{what} must be an integer"),
                self.raw,
            )),
        }
    }

    fn object(&self, i: usize) -> Result<scara_common::protocol::ObjectId, CommandError> {
        object_id(self.values[i]).map_err(|reason| CommandError::protocol(reason, self.raw))
    }
}
