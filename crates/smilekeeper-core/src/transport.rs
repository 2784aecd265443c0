//! Actuator transport boundary.
//!
//! The device speaks a line protocol: channel letter, decimal intensity
//! 0-100, newline. Intensity 0 means "off". All writes originate from
//! the single tick loop, so implementations need no internal locking.
//!
//! Write failures are non-fatal by contract: the controller treats a
//! failed send as "no pulse issued" and retries at the next eligible
//! window.

use std::io::Write;

use crate::error::TransportError;
use crate::session::{Channel, PulseCommand};

/// Byte sink for actuator commands.
pub trait Transport {
    /// Write one command. An error means the device did not receive it.
    fn send(&mut self, cmd: PulseCommand) -> Result<(), TransportError>;

    /// Whether a device is attached; actuation logic is skipped entirely
    /// while disconnected.
    fn is_connected(&self) -> bool;
}

/// Line-protocol transport over any byte sink (a serial device node,
/// a socket, a file).
pub struct LineTransport<W: Write> {
    sink: W,
}

impl<W: Write> LineTransport<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

impl<W: Write> Transport for LineTransport<W> {
    fn send(&mut self, cmd: PulseCommand) -> Result<(), TransportError> {
        self.sink
            .write_all(cmd.wire().as_bytes())
            .and_then(|_| self.sink.flush())
            .map_err(TransportError::WriteFailed)
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// Permanently disconnected transport. Every actuation branch is
/// skipped while it is in use.
#[derive(Debug, Default)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, _cmd: PulseCommand) -> Result<(), TransportError> {
        Err(TransportError::NotConnected)
    }

    fn is_connected(&self) -> bool {
        false
    }
}

/// Records every command instead of writing anywhere. Used by the
/// simulation harness and tests; can also simulate write failures.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<PulseCommand>,
    /// When set, every send fails without recording.
    pub fail_writes: bool,
    /// Sends to these channels fail without recording.
    pub fail_channels: Vec<Channel>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire labels of everything sent, e.g. `["A26", "A0"]`.
    pub fn labels(&self) -> Vec<String> {
        self.sent.iter().map(|c| c.label()).collect()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, cmd: PulseCommand) -> Result<(), TransportError> {
        if self.fail_writes || self.fail_channels.contains(&cmd.channel) {
            return Err(TransportError::WriteFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "simulated write failure",
            )));
        }
        self.sent.push(cmd);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }
}
