//! # amplib -- Linear Amplifier Control for Amateur Radio
//!
//! `amplib` is an asynchronous Rust library for controlling solid-state HF
//! linear amplifiers over their serial control ports. It is designed for
//! station automation and contest logging software that needs to follow
//! the transceiver's band, pick antennas, and watch for faults.
//!
//! ## Quick Start
//!
//! ```no_run
//! use amplib::Amplifier;
//! use amplib::spe::{SpeBuilder, models::expert_1_5k_fa};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let amp = SpeBuilder::new(expert_1_5k_fa())
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     println!("Band: {}", amp.get_band().await?);
//!     amp.set_antenna(2).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                  | Purpose                                          |
//! |------------------------|--------------------------------------------------|
//! | `amplib-core`          | [`Amplifier`] trait, types, errors               |
//! | `amplib-transport`     | Serial and serial-over-TCP transports            |
//! | `amplib-frame-io`      | Framing, transaction engine, status cache, converge loop |
//! | `amplib-spe`           | SPE Expert binary protocol driver                |
//! | **`amplib`**           | This facade crate -- re-exports everything       |
//!
//! All manufacturer drivers implement the [`Amplifier`] trait, so
//! application code can hold a `dyn Amplifier` and stay
//! manufacturer-agnostic.
//!
//! ## Feature Flags
//!
//! | Feature | Enables                           | Default |
//! |---------|-----------------------------------|---------|
//! | `spe`   | [`spe`] module (SPE Expert)       | yes     |
//! | `full`  | All manufacturer backends         | no      |
//!
//! ## Supported Amplifiers
//!
//! - **SPE**: Expert 1.3K-FA, 1.5K-FA, 2K-FA

pub use amplib_core::*;

/// SPE Expert backend.
///
/// Provides [`SpeAmp`](spe::SpeAmp) and [`SpeBuilder`](spe::SpeBuilder)
/// for the Expert 1.3K-FA, 1.5K-FA, and 2K-FA over their binary serial
/// protocol, including remote power-on through a modem control line.
#[cfg(feature = "spe")]
pub mod spe {
    pub use amplib_spe::*;
}

/// Returns a flat list of all supported amplifier models across all
/// enabled manufacturer backends.
///
/// # Example
///
/// ```
/// let amps = amplib::supported_amps();
/// for amp in &amps {
///     println!("{} {} ({})", amp.manufacturer, amp.model_name, amp.connection);
/// }
/// ```
pub fn supported_amps() -> Vec<AmpDefinition> {
    let mut amps = Vec::new();

    #[cfg(feature = "spe")]
    {
        amps.extend(
            spe::models::all_spe_models()
                .iter()
                .map(AmpDefinition::from),
        );
    }

    amps
}
