//! Command error taxonomy.
//!
//! Every rejected line is answered with exactly one `ERROR:<reason>:<raw>`
//! reply; nothing is silently dropped and nothing is retried.

use std::fmt;
use thiserror::Error;

/// Error class of a rejected command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed line, wrong arity, number that does not parse.
    Protocol,
    /// Well-formed value outside its permitted range.
    Range,
    /// Valid command refused in the current machine state.
    Rejected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Protocol => "protocol",
            ErrorKind::Range => "range",
            ErrorKind::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// A rejected command line.
///
/// `reason` is human readable and never contains `:` so the host can split
/// the reply on the first two colons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {reason} ({raw:?})")]
pub struct CommandError {
    pub kind: ErrorKind,
    pub reason: String,
    pub raw: String,
}

impl CommandError {
    fn new(kind: ErrorKind, reason: impl Into<String>, raw: &str) -> Self {
        Self {
            kind,
            reason: reason.into().replace(':', ";"),
            raw: raw.to_string(),
        }
    }

    /// Malformed line.
    pub fn protocol(reason: impl Into<String>, raw: &str) -> Self {
        Self::new(ErrorKind::Protocol, reason, raw)
    }

    /// Value out of range.
    pub fn range(reason: impl Into<String>, raw: &str) -> Self {
        Self::new(ErrorKind::Range, reason, raw)
    }

    /// Refused by machine state.
    pub fn rejected(reason: impl Into<String>, raw: &str) -> Self {
        Self::new(ErrorKind::Rejected, reason, raw)
    }
}
