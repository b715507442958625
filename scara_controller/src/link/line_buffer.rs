//! Fixed-capacity line assembler.
//!
//! Bytes accumulate until `\n`. A trailing `\r` is dropped, blank lines are
//! ignored, and a line longer than [`MAX_LINE_LEN`] is discarded up to its
//! newline and reported once as `line too long`. Bytes left over when the
//! input closes are reported as `missing newline` by [`LineBuffer::finish`].

use scara_common::consts::MAX_LINE_LEN;
use scara_common::protocol::CommandError;

/// Assembles protocol lines from raw serial bytes.
#[derive(Debug, Clone, Default)]
pub struct LineBuffer {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    overflow: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the incomplete line.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Feed one byte. Returns a finished line, or the error for a rejected
    /// one, when `byte` terminates it.
    pub fn push(&mut self, byte: u8) -> Option<Result<String, CommandError>> {
        if byte != b'\n' {
            if !self.overflow && self.buf.push(byte).is_err() {
                self.overflow = true;
            }
            return None;
        }

        let overflow = std::mem::take(&mut self.overflow);
        let mut bytes: &[u8] = &self.buf;
        if let [head @ .., b'\r'] = bytes {
            bytes = head;
        }
        let result = if overflow {
            Some(Err(CommandError::protocol(
                "line too long",
                &String::from_utf8_lossy(bytes),
            )))
        } else if bytes.iter().all(u8::is_ascii_whitespace) {
            None
        } else if !bytes.is_ascii() {
            Some(Err(CommandError::protocol(
                "non-ASCII input",
                &String::from_utf8_lossy(bytes),
            )))
        } else {
            Some(Ok(String::from_utf8_lossy(bytes).into_owned()))
        };
        self.buf.clear();
        result
    }

    /// End of input. Reports an unterminated trailing line, if any.
    pub fn finish(&mut self) -> Option<CommandError> {
        let overflow = std::mem::take(&mut self.overflow);
        if self.buf.is_empty() && !overflow {
            return None;
        }
        let raw = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        if !overflow && raw.trim().is_empty() {
            return None;
        }
        let reason = if overflow { "line too long" } else { "missing newline" };
        Some(CommandError::protocol(reason, raw.trim()))
    }
}
