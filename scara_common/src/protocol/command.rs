//! Typed protocol commands.

use crate::consts::MAX_OBJECT_ID_LEN;
use crate::hal::Axis;

/// Identifier assigned to a detected object by the vision pipeline.
pub type ObjectId = heapless::String<MAX_OBJECT_ID_LEN>;

/// Protocol verb (first character of a line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    MoveTo,
    MoveY,
    MoveZ,
    Gripper,
    Home,
    SetSpeed,
    SetAccel,
    Status,
    EmergencyStop,
    Pick,
    Place,
    VisionPick,
    Reset,
    ReportObject,
    Help,
}

impl Verb {
    /// Every verb, in help-text order.
    pub const ALL: [Verb; 15] = [
        Verb::MoveTo,
        Verb::MoveY,
        Verb::MoveZ,
        Verb::Gripper,
        Verb::Home,
        Verb::SetSpeed,
        Verb::SetAccel,
        Verb::Status,
        Verb::EmergencyStop,
        Verb::Pick,
        Verb::Place,
        Verb::VisionPick,
        Verb::Reset,
        Verb::ReportObject,
        Verb::Help,
    ];

    /// Wire character.
    pub const fn as_char(self) -> char {
        match self {
            Verb::MoveTo => 'X',
            Verb::MoveY => 'Y',
            Verb::MoveZ => 'Z',
            Verb::Gripper => 'G',
            Verb::Home => 'H',
            Verb::SetSpeed => 'S',
            Verb::SetAccel => 'A',
            Verb::Status => 'T',
            Verb::EmergencyStop => 'E',
            Verb::Pick => 'K',
            Verb::Place => 'C',
            Verb::VisionPick => 'V',
            Verb::Reset => 'R',
            Verb::ReportObject => 'O',
            Verb::Help => '?',
        }
    }

    /// Decode a wire character. Verbs are case-sensitive.
    pub fn from_char(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_char() == c)
    }

    /// Number of comma-separated parameters; 0 means the bare verb form.
    pub const fn arity(self) -> usize {
        match self {
            Verb::MoveTo => 4,
            Verb::ReportObject => 3,
            Verb::Pick | Verb::Place => 2,
            Verb::MoveY
            | Verb::MoveZ
            | Verb::Gripper
            | Verb::SetSpeed
            | Verb::SetAccel
            | Verb::VisionPick => 1,
            Verb::Home | Verb::Status | Verb::EmergencyStop | Verb::Reset | Verb::Help => 0,
        }
    }
}

/// A fully validated command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `X:x,y,z,speed`: absolute move of all axes.
    MoveTo { x: f64, y: f64, z: f64, speed: u8 },
    /// `Y:d` / `Z:d`: relative move of one axis.
    MoveRelative { axis: Axis, distance: f64 },
    /// `G:angle`: gripper servo angle.
    Gripper { angle: f64 },
    /// `H`: move to (0, 0, 0).
    Home,
    /// `S:speed`: default speed (0–100).
    SetSpeed(u8),
    /// `A:accel`: default acceleration (0–100).
    SetAccel(u8),
    /// `T`: status query.
    Status,
    /// `E`: emergency stop.
    EmergencyStop,
    /// `K:x,y`: pick sequence.
    Pick { x: f64, y: f64 },
    /// `C:x,y`: place sequence.
    Place { x: f64, y: f64 },
    /// `V:id`: pick the object the vision pipeline reported under `id`.
    VisionPick { object: ObjectId },
    /// `R`: clear the emergency latch.
    Reset,
    /// `O:id,x,y`: vision object location report.
    ReportObject { object: ObjectId, x: f64, y: f64 },
    /// `?`: list supported verbs.
    Help,
}

impl Command {
    /// Verb this command was decoded from.
    pub const fn verb(&self) -> Verb {
        match self {
            Command::MoveTo { .. } => Verb::MoveTo,
            Command::MoveRelative { axis: Axis::Z, .. } => Verb::MoveZ,
            Command::MoveRelative { .. } => Verb::MoveY,
            Command::Gripper { .. } => Verb::Gripper,
            Command::Home => Verb::Home,
            Command::SetSpeed(_) => Verb::SetSpeed,
            Command::SetAccel(_) => Verb::SetAccel,
            Command::Status => Verb::Status,
            Command::EmergencyStop => Verb::EmergencyStop,
            Command::Pick { .. } => Verb::Pick,
            Command::Place { .. } => Verb::Place,
            Command::VisionPick { .. } => Verb::VisionPick,
            Command::Reset => Verb::Reset,
            Command::ReportObject { .. } => Verb::ReportObject,
            Command::Help => Verb::Help,
        }
    }

    /// Whether executing the command moves an axis or the gripper.
    ///
    /// These are refused while the emergency latch is set.
    pub const fn issues_motion(&self) -> bool {
        matches!(
            self,
            Command::MoveTo { .. }
                | Command::MoveRelative { .. }
                | Command::Gripper { .. }
                | Command::Home
                | Command::Pick { .. }
                | Command::Place { .. }
                | Command::VisionPick { .. }
        )
    }
}
