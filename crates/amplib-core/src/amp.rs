//! The `Amplifier` trait -- unified interface for all amplifier backends.
//!
//! Station automation and contest software program against `dyn Amplifier`
//! without needing to know which vendor protocol is in use. Each backend
//! crate (amplib-spe, ...) provides a concrete type implementing it.

use async_trait::async_trait;

use crate::band::Band;
use crate::error::{Error, Result};
use crate::types::*;

/// Unified asynchronous interface for controlling a linear amplifier.
///
/// Getters may be answered from a short-lived status cache; setters always
/// observe the live device state before and after acting. Setters for
/// values the device only exposes as a toggle (antenna, input, power level,
/// operate) step the device until it reports the requested value or a
/// bounded number of toggles has been issued, in which case they fail with
/// [`Error::Convergence`].
#[async_trait]
pub trait Amplifier: Send + Sync {
    /// Return static information about the connected amplifier.
    fn info(&self) -> &AmpInfo;

    /// Return the capabilities of the connected amplifier.
    fn capabilities(&self) -> &AmpCapabilities;

    /// Get the mains power and operate/standby state.
    ///
    /// An amplifier that does not answer is reported as [`PowerState::Off`].
    async fn get_power_state(&self) -> Result<PowerState>;

    /// Change the mains power or operate/standby state.
    async fn set_power_state(&self, state: PowerState) -> Result<()>;

    /// Get the currently selected band.
    async fn get_band(&self) -> Result<Band>;

    /// Select a band.
    async fn set_band(&self, _band: Band) -> Result<()> {
        Err(Error::Unsupported("band selection not supported".into()))
    }

    /// Select the band containing `freq_hz`, as when following a
    /// transceiver's VFO.
    ///
    /// Fails with [`Error::InvalidParameter`] before any traffic if the
    /// frequency lies outside every band.
    async fn set_frequency(&self, freq_hz: u64) -> Result<()> {
        let band = Band::from_freq(freq_hz).ok_or_else(|| {
            Error::InvalidParameter(format!("{freq_hz} Hz is not inside an amateur band"))
        })?;
        self.set_band(band).await
    }

    /// Frequency edges of the currently selected band.
    async fn get_band_range(&self) -> Result<BandRange> {
        Ok(self.get_band().await?.freq_range())
    }

    /// Get the selected transmit antenna (1-based).
    async fn get_antenna(&self) -> Result<u8>;

    /// Select a transmit antenna (1-based).
    async fn set_antenna(&self, antenna: u8) -> Result<()>;

    /// Get the selected exciter input (1-based).
    async fn get_input(&self) -> Result<u8>;

    /// Select an exciter input (1-based).
    async fn set_input(&self, input: u8) -> Result<()>;

    /// Get the output power level setting.
    async fn get_power_level(&self) -> Result<PowerLevel>;

    /// Set the output power level.
    async fn set_power_level(&self, level: PowerLevel) -> Result<()>;

    /// Returns `true` while the amplifier is transmitting.
    async fn get_ptt(&self) -> Result<bool>;

    /// Read output power, SWR, PA voltage/current, and temperature.
    async fn get_meters(&self) -> Result<AmpMeters>;

    /// Read the current fault (alarm) condition.
    async fn get_fault(&self) -> Result<AmpAlert>;

    /// Read the current warning condition.
    async fn get_warning(&self) -> Result<AmpAlert>;

    /// Start an antenna tuner cycle.
    async fn tune(&self) -> Result<()> {
        Err(Error::Unsupported("antenna tuner not supported".into()))
    }

    /// Clear a latched fault.
    async fn reset(&self) -> Result<()> {
        Err(Error::Unsupported("fault reset not supported".into()))
    }
}
