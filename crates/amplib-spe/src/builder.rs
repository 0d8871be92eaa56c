//! SpeBuilder -- fluent builder for constructing [`SpeAmp`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! the serial port, timing, caching, and power-on wiring before the
//! transport is opened.
//!
//! # Example
//!
//! ```no_run
//! use amplib_spe::builder::SpeBuilder;
//! use amplib_spe::models::expert_1_5k_fa;
//! use std::time::Duration;
//!
//! # async fn example() -> amplib_core::Result<()> {
//! let amp = SpeBuilder::new(expert_1_5k_fa())
//!     .serial_port("/dev/ttyUSB0")
//!     .command_timeout(Duration::from_millis(300))
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use amplib_core::error::{Error, Result};
use amplib_core::transport::Transport;
use amplib_core::types::{AmpInfo, ConnectionType, ControlLine, Manufacturer};
use amplib_frame_io::{LinePulse, Session, TransactionEngine};

use crate::amp::SpeAmp;
use crate::commands;
use crate::models::SpeModel;
use crate::protocol::CODEC;
use crate::status::SpeDecoder;

/// Status frames take about 6 ms on the wire at 115200 baud; the Expert
/// firmware answers well inside this.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

/// Long enough for one poll cycle to answer several getters from a
/// single status frame.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(40);

pub const DEFAULT_STATUS_RETRIES: u32 = 1;

/// Fluent builder for [`SpeAmp`].
///
/// Everything has a default derived from the [`SpeModel`], so the
/// simplest usage is:
///
/// ```ignore
/// let amp = SpeBuilder::new(expert_2k_fa())
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// ```
pub struct SpeBuilder {
    model: SpeModel,
    serial_port: Option<String>,
    baud_rate: Option<u32>,
    command_timeout: Duration,
    cache_ttl: Duration,
    status_retries: u32,
    power_on_line: Option<ControlLine>,
    power_on_pulse: Option<Duration>,
    power_on_settle: Option<Duration>,
    connection: ConnectionType,
}

impl SpeBuilder {
    /// Create a new builder for the given Expert model.
    pub fn new(model: SpeModel) -> Self {
        SpeBuilder {
            model,
            serial_port: None,
            baud_rate: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            status_retries: DEFAULT_STATUS_RETRIES,
            power_on_line: None,
            power_on_pulse: None,
            power_on_settle: None,
            connection: ConnectionType::Serial,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the default baud rate for this model.
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = Some(baud);
        self
    }

    /// Deadline for one complete request/response exchange (default: 500ms).
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// How long a status frame may answer getters without a new read
    /// (default: 40ms). Zero disables caching.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Extra attempts a status read gets after a garbled frame (default: 1).
    pub fn status_retries(mut self, retries: u32) -> Self {
        self.status_retries = retries;
        self
    }

    /// Control line wired to the amplifier's remote power-on input.
    pub fn power_on_line(mut self, line: ControlLine) -> Self {
        self.power_on_line = Some(line);
        self
    }

    pub fn power_on_pulse(mut self, hold: Duration) -> Self {
        self.power_on_pulse = Some(hold);
        self
    }

    /// Time allowed for the amplifier to boot after the power-on pulse.
    pub fn power_on_settle(mut self, settle: Duration) -> Self {
        self.power_on_settle = Some(settle);
        self
    }

    /// Build an [`SpeAmp`] with a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport` from
    /// `amplib-test-harness`) and for callers that manage the transport
    /// themselves.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<SpeAmp> {
        if self.command_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "command_timeout must be greater than zero".into(),
            ));
        }
        let power_on = LinePulse {
            line: self.power_on_line.unwrap_or(self.model.power_on_line),
            hold: self.power_on_pulse.unwrap_or(self.model.power_on_pulse),
            settle: self.power_on_settle.unwrap_or(self.model.power_on_settle),
        };
        if power_on.hold.is_zero() {
            return Err(Error::InvalidParameter(
                "power_on_pulse must be greater than zero".into(),
            ));
        }

        tracing::debug!(
            model = self.model.name,
            timeout_ms = self.command_timeout.as_millis(),
            cache_ttl_ms = self.cache_ttl.as_millis(),
            "Building SPE amplifier"
        );

        let engine = TransactionEngine::new(transport, CODEC, self.command_timeout);
        let session = Session::new(
            engine,
            SpeDecoder,
            commands::cmd_status(),
            self.cache_ttl,
            self.status_retries,
        );
        let info = AmpInfo {
            manufacturer: Manufacturer::Spe,
            model_name: self.model.name.to_string(),
            model_id: self.model.model_id.to_string(),
            connection: self.connection,
        };
        let mut capabilities = self.model.capabilities;
        if self.connection == ConnectionType::Network {
            capabilities.has_remote_power_on = false;
        }

        Ok(SpeAmp::new(session, info, capabilities, power_on))
    }

    /// Build an [`SpeAmp`] using a serial transport.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    /// The baud rate defaults to the model's default if not overridden.
    pub async fn build(self) -> Result<SpeAmp> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let baud = self.baud_rate.unwrap_or(self.model.default_baud_rate);

        let transport = amplib_transport::SerialTransport::open(port, baud).await?;
        self.build_with_transport(Box::new(transport)).await
    }

    /// Build an [`SpeAmp`] over a serial-to-TCP bridge at `addr`.
    ///
    /// Remote power-on is unavailable this way, since a TCP bridge carries
    /// no modem control lines.
    pub async fn build_tcp(self, addr: &str) -> Result<SpeAmp> {
        let transport = amplib_transport::TcpTransport::connect(addr).await?;
        self.over_network()
            .build_with_transport(Box::new(transport))
            .await
    }

    fn over_network(mut self) -> Self {
        self.connection = ConnectionType::Network;
        self
    }
}
