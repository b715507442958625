//! SCARA Common Library
//!
//! Shared types for the SCARA motion controller workspace: configuration
//! loading, the mechanical unit converter, the serial line protocol types and
//! the hardware abstraction contract.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and controller configuration
//! - [`consts`] - System-wide numeric limits
//! - [`units`] - Millimetre ↔ step conversion
//! - [`protocol`] - Commands, replies and status telemetry
//! - [`hal`] - Hardware abstraction trait and sensor types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use scara_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod prelude;
pub mod protocol;
pub mod units;
