//! Serial transport.
//!
//! A background thread performs the blocking reads and forwards byte chunks
//! over a bounded `crossbeam-channel`; the control loop drains it with
//! `try_recv` and never blocks on input. Replies are written line by line.
//!
//! The port path `-` selects stdin/stdout. A device path that is a terminal
//! is switched to raw mode at the configured baud rate; anything else (a
//! FIFO, a pty stand-in, a plain file) is used as is.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, TryRecvError};
use nix::errno::Errno;
use nix::sys::termios::{self, BaudRate, SetArg};
use scara_common::protocol::Reply;
use tracing::{debug, info, warn};

use crate::error::LinkError;

/// Port name that selects the process's stdin/stdout.
pub const STDIO_PORT: &str = "-";

/// Chunks buffered between the reader thread and the loop.
const CHANNEL_DEPTH: usize = 64;

const READ_CHUNK: usize = 256;

/// Bidirectional line link to the host.
pub struct SerialLink {
    rx: Receiver<Vec<u8>>,
    writer: Box<dyn Write + Send>,
    reader: Option<JoinHandle<()>>,
}

impl SerialLink {
    /// Open `port` (a device path or [`STDIO_PORT`]) at `baud_rate`.
    pub fn open(port: &str, baud_rate: u32) -> Result<Self, LinkError> {
        if port == STDIO_PORT {
            info!("serial link on stdin/stdout");
            return Ok(Self::from_parts(io::stdin(), io::stdout()));
        }

        let open_err = |source| LinkError::Open {
            port: port.to_string(),
            source,
        };
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(port)
            .map_err(open_err)?;
        configure_line(&device, baud_rate).map_err(|source| LinkError::Configure {
            port: port.to_string(),
            source,
        })?;
        let writer = device.try_clone().map_err(open_err)?;
        info!(port, baud_rate, "serial link open");
        Ok(Self::from_parts(device, writer))
    }

    /// Build a link over any reader/writer pair.
    pub fn from_parts<R, W>(reader: R, writer: W) -> Self
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(CHANNEL_DEPTH);
        let handle = thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || read_loop(reader, tx))
            .map_err(|e| warn!("failed to spawn serial reader: {e}"))
            .ok();
        Self {
            rx,
            writer: Box::new(writer),
            reader: handle,
        }
    }

    /// Next received chunk, if any. Never blocks.
    ///
    /// Returns [`LinkError::Closed`] once the reader has exited and every
    /// chunk has been drained.
    pub fn poll(&self) -> Result<Option<Vec<u8>>, LinkError> {
        match self.rx.try_recv() {
            Ok(chunk) => Ok(Some(chunk)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(LinkError::Closed),
        }
    }

    /// Write one reply line.
    pub fn send(&mut self, reply: &Reply) -> Result<(), LinkError> {
        writeln!(self.writer, "{reply}")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        // The reader may be parked in a blocking read; detach it.
        if let Some(handle) = self.reader.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

fn baud_rate(rate: u32) -> Option<BaudRate> {
    Some(match rate {
        1_200 => BaudRate::B1200,
        2_400 => BaudRate::B2400,
        4_800 => BaudRate::B4800,
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        460_800 => BaudRate::B460800,
        921_600 => BaudRate::B921600,
        _ => return None,
    })
}

/// Raw mode at `rate`. Devices that are not terminals are left untouched.
fn configure_line(device: &File, rate: u32) -> io::Result<()> {
    let speed = baud_rate(rate).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("unsupported baud rate {rate}"))
    })?;
    let mut attrs = match termios::tcgetattr(device) {
        Ok(attrs) => attrs,
        Err(Errno::ENOTTY) => {
            warn!("serial device is not a terminal, line settings not applied");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    termios::cfmakeraw(&mut attrs);
    termios::cfsetspeed(&mut attrs, speed)?;
    termios::tcsetattr(device, SetArg::TCSANOW, &attrs)?;
    debug!(rate, "serial line configured");
    Ok(())
}

fn read_loop<R: Read>(mut reader: R, tx: crossbeam_channel::Sender<Vec<u8>>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("serial input reached end of stream");
                break;
            }
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("serial read failed: {e}");
                break;
            }
        }
    }
}
