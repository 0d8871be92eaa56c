//! Framed request/response plumbing shared by amplib device backends.
//!
//! Binary serial protocols of the "sync, length, payload, checksum" family
//! all need the same machinery, so it lives here once:
//!
//! - [`codec`]: frame layouts, checksums, encode and validate
//! - [`engine`]: one-transaction-at-a-time exchange over a
//!   [`Transport`](amplib_core::Transport) with a per-transaction deadline
//! - [`cache`]: TTL-bounded cache of the last status snapshot
//! - [`fields`]: fixed-width status field descriptors and the
//!   [`StatusDecoder`] trait
//! - [`converge`]: observe/toggle loop for settings that can only be stepped
//! - [`session`]: the per-handle bundle a backend locks for each operation

pub mod cache;
pub mod codec;
pub mod converge;
pub mod engine;
pub mod fields;
pub mod session;

pub use cache::{CacheEntry, StatusCache};
pub use codec::{
    Checksum, ChecksumCoverage, Command, FrameCodec, FrameFormat, FrameLayout, Payload,
};
pub use converge::{converge, ConvergeRequest, ToggleControl};
pub use engine::{LinePulse, TransactionEngine};
pub use fields::{parse_char, parse_number, ByteField, Field, StatusDecoder};
pub use session::Session;
