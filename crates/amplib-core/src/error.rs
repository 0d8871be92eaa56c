//! Error types for amplib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport failures, timeouts, protocol
//! violations, and rejected state changes are kept as distinct variants so
//! callers can apply different retry policies to each.

use std::fmt;

use crate::helpers::hex_dump;

/// The error type for all amplib operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port, TCP socket).
    #[error("transport error: {0}")]
    Transport(String),

    /// The device sent bytes that violate the wire protocol.
    ///
    /// Carries the offending bytes so callers can log a hex dump.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Timed out waiting for a response from the device.
    ///
    /// This typically indicates the amplifier is powered off, the baud rate
    /// is wrong, or the cable is disconnected.
    #[error("timeout waiting for response")]
    Timeout,

    /// A converging setter exhausted its toggle budget without the device
    /// reaching the requested state.
    ///
    /// The link itself is working; the device refused or could not reach
    /// the target (for example an antenna port disabled in its menu).
    #[error(
        "{operation} did not converge: wanted {desired}, device reports {observed} after {toggles} toggles"
    )]
    Convergence {
        /// Name of the setter that gave up (e.g. `"set_antenna"`).
        operation: &'static str,
        /// The requested value.
        desired: String,
        /// The last value the device reported.
        observed: String,
        /// Number of toggle commands issued before giving up.
        toggles: u32,
    },

    /// A command could not be framed for the wire.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The requested operation is not supported by this device.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// A caller-supplied value is outside the device's capabilities.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the device has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a protocol error from a kind and the bytes that triggered it.
    pub fn protocol(kind: ProtocolErrorKind, bytes: &[u8]) -> Self {
        Error::Protocol(ProtocolError::new(kind, bytes))
    }

    /// Returns the protocol error kind, if this is a protocol error.
    pub fn protocol_kind(&self) -> Option<&ProtocolErrorKind> {
        match self {
            Error::Protocol(e) => Some(&e.kind),
            _ => None,
        }
    }
}

/// What went wrong while framing or decoding device bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// The leading bytes did not match the expected sync pattern.
    UnexpectedSync,
    /// Fewer or more bytes than the frame declared.
    LengthMismatch { expected: usize, actual: usize },
    /// The trailing checksum did not match the recomputed one.
    ChecksumFailed { expected: u16, actual: u16 },
    /// An acknowledgement's echo byte disagreed with its own checksum byte.
    AckChecksumFailed { echo: u8, checksum: u8 },
    /// The device acknowledged a different opcode than the one sent.
    UnexpectedAck { expected: u8, actual: u8 },
    /// The delimiter or terminator after the checksum was wrong.
    MalformedTrailer,
    /// A fixed-width status field was short or did not parse.
    FieldParseFailed { field: &'static str },
    /// The band code is not in the device's band table.
    UnknownBand { code: String },
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolErrorKind::UnexpectedSync => write!(f, "unexpected sync bytes"),
            ProtocolErrorKind::LengthMismatch { expected, actual } => {
                write!(f, "length mismatch: expected {expected} bytes, got {actual}")
            }
            ProtocolErrorKind::ChecksumFailed { expected, actual } => write!(
                f,
                "checksum failed: computed 0x{expected:04X}, frame carries 0x{actual:04X}"
            ),
            ProtocolErrorKind::AckChecksumFailed { echo, checksum } => write!(
                f,
                "ack checksum failed: echo 0x{echo:02X} != checksum 0x{checksum:02X}"
            ),
            ProtocolErrorKind::UnexpectedAck { expected, actual } => write!(
                f,
                "unexpected ack: sent opcode 0x{expected:02X}, device echoed 0x{actual:02X}"
            ),
            ProtocolErrorKind::MalformedTrailer => write!(f, "malformed frame trailer"),
            ProtocolErrorKind::FieldParseFailed { field } => {
                write!(f, "failed to parse field '{field}'")
            }
            ProtocolErrorKind::UnknownBand { code } => write!(f, "unknown band code '{code}'"),
        }
    }
}

/// A protocol violation together with the raw bytes that caused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} [{}]", hex_dump(.bytes))]
pub struct ProtocolError {
    /// What went wrong.
    pub kind: ProtocolErrorKind,
    /// The offending bytes, kept for deep debugging.
    pub bytes: Vec<u8>,
}

impl ProtocolError {
    pub fn new(kind: ProtocolErrorKind, bytes: &[u8]) -> Self {
        ProtocolError {
            kind,
            bytes: bytes.to_vec(),
        }
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
