//! Serial port transport.
//!
//! [`SerialTransport`] implements [`Transport`] for USB virtual COM ports
//! and RS-232 links. Besides byte I/O it can flush the OS input queue and
//! drive the DTR/RTS modem lines, which some amplifiers wire to their
//! remote power-on input.

use amplib_core::error::{Error, Result};
use amplib_core::transport::Transport;
use amplib_core::types::ControlLine;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{
    ClearBuffer, DataBits, FlowControl, Parity, SerialPort, SerialPortBuilderExt, SerialStream,
    StopBits,
};

/// Serial line settings.
///
/// Defaults to 115200 baud, 8N1, no flow control, which is what the SPE
/// Expert family ships with.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

impl SerialConfig {
    /// Default line settings at the given baud rate.
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }
}

/// Serial port transport.
pub struct SerialTransport {
    port: Option<SerialStream>,
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port at `baud_rate` with 8N1 and no flow control.
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with_config(port, SerialConfig::with_baud_rate(baud_rate)).await
    }

    /// Open a serial port with explicit line settings.
    ///
    /// DTR and RTS are released immediately after opening so that a line
    /// wired to the amplifier's power-on input is not left asserted by the
    /// OS default.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let mut stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("failed to open serial port {port}: {e}"))
            })?;

        for line in [ControlLine::Dtr, ControlLine::Rts] {
            if let Err(e) = write_line(&mut stream, line, false) {
                tracing::warn!(port = %port, line = %line, error = %e, "Failed to release control line");
            }
        }

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(stream),
            port_name: port.to_string(),
        })
    }

    /// The path this transport was opened on.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

fn write_line(
    stream: &mut SerialStream,
    line: ControlLine,
    asserted: bool,
) -> tokio_serial::Result<()> {
    match line {
        ControlLine::Dtr => stream.write_data_terminal_ready(asserted),
        ControlLine::Rts => stream.write_request_to_send(asserted),
    }
}

fn map_io_error(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::NotConnected => Error::ConnectionLost,
        _ => Error::Io(e),
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(port = %self.port_name, bytes = data.len(), "Writing frame");

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Serial write failed");
            map_io_error(e)
        })?;
        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Serial flush failed");
            map_io_error(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(n)) => {
                tracing::trace!(port = %self.port_name, bytes = n, "Read from serial port");
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Serial read failed");
                Err(map_io_error(e))
            }
            Err(_) => {
                tracing::trace!(
                    port = %self.port_name,
                    timeout_ms = timeout.as_millis(),
                    "Serial read timed out"
                );
                Err(Error::Timeout)
            }
        }
    }

    async fn discard_input(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        port.clear(ClearBuffer::Input).map_err(|e| {
            Error::Transport(format!("failed to clear input on {}: {e}", self.port_name))
        })
    }

    async fn set_control_line(&mut self, line: ControlLine, asserted: bool) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        tracing::debug!(port = %self.port_name, line = %line, asserted, "Setting control line");
        write_line(port, line, asserted).map_err(|e| {
            Error::Transport(format!("failed to set {line} on {}: {e}", self.port_name))
        })
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush().await {
                tracing::warn!(port = %self.port_name, error = %e, "Flush before close failed");
            }
            tracing::info!(port = %self.port_name, "Serial port closed");
        }
        Ok(())
    }

    fn has_control_lines(&self) -> bool {
        true
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_8n1_at_115200() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn with_baud_rate_keeps_line_defaults() {
        let config = SerialConfig::with_baud_rate(9600);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.parity, Parity::None);
    }

    #[tokio::test]
    async fn open_missing_port_is_transport_error() {
        let result = SerialTransport::open("/dev/amplib-no-such-port", 115_200).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
