//! Host command handling.
//!
//! - [`parser`] - protocol line → validated [`scara_common::protocol::Command`]
//! - [`dispatch`] - command → channel mutation, sequence, table update or query

pub mod dispatch;
pub mod parser;

pub use parser::CommandParser;
