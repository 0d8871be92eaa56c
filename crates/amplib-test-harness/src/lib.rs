//! Test utilities for amplib.
//!
//! Provides [`MockTransport`], a scripted [`Transport`](amplib_core::Transport)
//! that lets the frame engine and device backends be exercised without
//! hardware.

pub mod mock_serial;

pub use mock_serial::MockTransport;
