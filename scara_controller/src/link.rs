//! Serial link to the host.
//!
//! - [`line_buffer`] - byte stream → protocol lines
//! - [`serial`] - device / stdio transport with a background reader

pub mod line_buffer;
pub mod serial;

pub use line_buffer::LineBuffer;
pub use serial::SerialLink;
