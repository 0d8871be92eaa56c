//! Transport implementations for amplib.
//!
//! Concrete implementations of the [`Transport`](amplib_core::Transport)
//! trait from `amplib-core`:
//!
//! - [`SerialTransport`]: USB virtual COM ports and RS-232 connections,
//!   with DTR/RTS control for remote power-on
//! - [`TcpTransport`]: serial-over-network bridges (ser2net, remote serial
//!   servers) carrying the same byte stream over TCP
//!
//! # Example
//!
//! ```no_run
//! use amplib_transport::SerialTransport;
//! use amplib_core::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> amplib_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 115200).await?;
//!
//! // SPE status request
//! transport.send(&[0x55, 0x55, 0x55, 0x01, 0x90, 0x90]).await?;
//!
//! let mut buf = [0u8; 128];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;
pub mod tcp;

pub use serial::{SerialConfig, SerialTransport};
pub use tcp::TcpTransport;
