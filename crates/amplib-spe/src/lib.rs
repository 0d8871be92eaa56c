//! amplib-spe -- SPE Expert linear amplifier backend for amplib.
//!
//! This crate implements the [`Amplifier`](amplib_core::Amplifier) trait for
//! the SPE Expert 1.3K-FA, 1.5K-FA, and 2K-FA over their binary serial
//! protocol: `55 55 55`-prefixed single-opcode requests, answered by a
//! comma-separated status frame or a two-byte acknowledgement.
//!
//! The Expert has no "set antenna N" style commands; every setting is
//! stepped like a front-panel button. [`SpeAmp`] hides that by reading
//! status, toggling, and re-reading until the requested value is reported
//! or a toggle budget runs out.
//!
//! # Modules
//!
//! - [`protocol`] -- frame layout and the shared codec
//! - [`commands`] -- opcodes and command builders
//! - [`status`] -- status frame decoding and alarm/warning codes
//! - [`models`] -- per-model capabilities
//! - [`amp`] -- the [`SpeAmp`] handle
//! - [`builder`] -- fluent [`SpeBuilder`]

pub mod amp;
pub mod builder;
pub mod commands;
pub mod models;
pub mod protocol;
pub mod status;

pub use amp::SpeAmp;
pub use builder::SpeBuilder;
pub use models::SpeModel;
pub use status::{Alarm, StatusSnapshot, Warning};
