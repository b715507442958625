//! Error types of the controller crate.
//!
//! Command-level failures travel as [`scara_common::protocol::CommandError`]
//! and become `ERROR:` replies. The types here cover the layers around the
//! protocol: axis channels, the vision table, the serial link and the cycle
//! runner.

use scara_common::hal::Axis;
use thiserror::Error;

/// Axis channel refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AxisError {
    /// Channel is inhibited by the emergency latch.
    #[error("axis {0} inhibited by emergency stop")]
    Inhibited(Axis),
}

/// Vision object table errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisionError {
    /// All table slots are taken.
    #[error("object table full")]
    TableFull,

    /// Identifier is empty, too long or uses characters outside `[A-Za-z0-9_-]`.
    #[error("invalid object id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },

    /// Coordinate outside the workspace footprint.
    #[error("object '{0}' outside the workspace")]
    OutOfBounds(String),
}

/// Serial link errors.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Device could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// Line settings could not be applied to the device.
    #[error("failed to configure serial port {port}: {source}")]
    Configure {
        port: String,
        #[source]
        source: std::io::Error,
    },

    /// Write to the link failed.
    #[error("serial write failed: {0}")]
    Write(#[from] std::io::Error),

    /// Reader thread has exited (end of input or read error).
    #[error("serial link closed")]
    Closed,
}

/// Errors that stop the cycle runner.
#[derive(Debug, Error)]
pub enum CycleError {
    /// Serial link failure.
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// Invalid runner setup.
    #[error("cycle setup error: {0}")]
    Setup(String),
}
