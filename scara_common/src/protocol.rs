//! Serial line protocol types.
//!
//! One command per `\n`-terminated ASCII line: `<VERB>:<p1>,<p2>,...` or a
//! bare verb for the parameterless commands. Every line gets exactly one
//! reply line; the controller also emits unsolicited `STATUS:` telemetry and
//! interlock notifications.

pub mod command;
pub mod error;
pub mod reply;

pub use command::{Command, ObjectId, Verb};
pub use error::{CommandError, ErrorKind};
pub use reply::{Reply, StatusReport};
