//! Transport trait for amplifier communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a device.
//! Implementations exist for serial ports, serial-over-TCP bridges, and a
//! mock transport for testing (`amplib-test-harness`).
//!
//! Protocol engines (e.g. the transaction engine in `amplib-frame-io`)
//! operate on a `Transport` rather than directly on a serial port, enabling
//! both real hardware control and deterministic unit testing.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::ControlLine;

/// Asynchronous byte-level transport to a device.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. Framing, checksums, and request/response pairing belong to the
/// protocol engines that consume this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the device.
    ///
    /// Either every byte is written or an error is returned; a short write
    /// is reported as an error, never as success.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`] if no data is received
    /// within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Discard any received bytes that have not been read yet.
    ///
    /// Called before every transaction so that a stale partial frame from
    /// an earlier failed exchange cannot be taken for the next response.
    async fn discard_input(&mut self) -> Result<()>;

    /// Drive a modem control line (DTR or RTS).
    ///
    /// Transports without control lines return [`Error::Unsupported`].
    async fn set_control_line(&mut self, line: ControlLine, asserted: bool) -> Result<()> {
        let _ = asserted;
        Err(Error::Unsupported(format!(
            "{line} control line not available on this transport"
        )))
    }

    /// Whether [`set_control_line`](Self::set_control_line) can work on
    /// this transport.
    fn has_control_lines(&self) -> bool {
        false
    }

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
