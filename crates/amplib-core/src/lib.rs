//! amplib-core: Core traits, types, and error definitions for amplib.
//!
//! This crate defines the manufacturer-agnostic abstractions that all amplib
//! backends implement. Station software depends on these types without
//! pulling in any specific amplifier driver.
//!
//! # Key types
//!
//! - [`Amplifier`] -- the unified trait for controlling any amplifier
//! - [`Transport`] -- byte-level communication channel
//! - [`Error`] / [`Result`] -- error handling, including [`ProtocolError`]

pub mod amp;
pub mod band;
pub mod error;
pub mod helpers;
pub mod transport;
pub mod types;

pub use amp::Amplifier;
pub use band::{Band, ParseBandError};
pub use error::{Error, ProtocolError, ProtocolErrorKind, Result};
pub use helpers::hex_dump;
pub use transport::Transport;
pub use types::*;
