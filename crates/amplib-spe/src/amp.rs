//! SpeAmp -- the [`Amplifier`] implementation for SPE Expert amplifiers.
//!
//! Each handle owns one [`Session`] behind an async mutex. Every public
//! operation holds the lock from its first status read to its last
//! acknowledgement, so a converging setter is never interleaved with
//! another caller's traffic on the same serial line.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use amplib_core::amp::Amplifier;
use amplib_core::error::{Error, Result};
use amplib_core::types::{AmpAlert, AmpCapabilities, AmpInfo, AmpMeters, PowerLevel, PowerState};
use amplib_core::Band;
use amplib_frame_io::{ConvergeRequest, LinePulse, Session};

use crate::commands;
use crate::status::{SpeDecoder, StatusSnapshot};

/// Standby and operate.
const OPERATE_STATES: u32 = 2;

/// Power-on pulses tried before giving up.
const POWER_ON_ATTEMPTS: u32 = 2;

/// An SPE Expert amplifier connected over serial or serial-over-TCP.
///
/// Construct with [`SpeBuilder`](crate::builder::SpeBuilder).
pub struct SpeAmp {
    session: Mutex<Session<SpeDecoder>>,
    info: AmpInfo,
    capabilities: AmpCapabilities,
    power_on: LinePulse,
}

impl SpeAmp {
    pub(crate) fn new(
        session: Session<SpeDecoder>,
        info: AmpInfo,
        capabilities: AmpCapabilities,
        power_on: LinePulse,
    ) -> Self {
        SpeAmp {
            session: Mutex::new(session),
            info,
            capabilities,
            power_on,
        }
    }

    /// The full decoded status frame.
    ///
    /// With `use_cache` a snapshot younger than the cache TTL is returned
    /// without talking to the amplifier.
    pub async fn status(&self, use_cache: bool) -> Result<Arc<StatusSnapshot>> {
        self.session.lock().await.get_status(use_cache).await
    }

    /// The last successfully decoded status, however old.
    pub async fn last_status(&self) -> Option<Arc<StatusSnapshot>> {
        self.session.lock().await.cached()
    }

    pub async fn cache_ttl(&self) -> Duration {
        self.session.lock().await.cache_ttl()
    }

    /// Change how long a status read may be served from cache. Zero
    /// disables caching.
    pub async fn set_cache_ttl(&self, ttl: Duration) {
        self.session.lock().await.set_cache_ttl(ttl);
    }

    pub async fn command_timeout(&self) -> Duration {
        self.session.lock().await.engine().command_timeout()
    }

    /// Change the deadline for one request/response exchange.
    pub async fn set_command_timeout(&self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "command_timeout must be greater than zero".into(),
            ));
        }
        self.session.lock().await.set_command_timeout(timeout);
        Ok(())
    }

    /// Close the link. Cached status is discarded.
    pub async fn close(&self) -> Result<()> {
        tracing::info!(model = %self.info.model_name, "Closing amplifier");
        self.session.lock().await.close().await
    }

    async fn converge_operate(
        session: &mut Session<SpeDecoder>,
        operation: &'static str,
        desired: PowerState,
    ) -> Result<()> {
        session
            .converge(
                &ConvergeRequest::new(operation, desired, OPERATE_STATES),
                StatusSnapshot::power_state,
                |_, _| commands::cmd_operate(),
            )
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Amplifier for SpeAmp {
    fn info(&self) -> &AmpInfo {
        &self.info
    }

    fn capabilities(&self) -> &AmpCapabilities {
        &self.capabilities
    }

    async fn get_power_state(&self) -> Result<PowerState> {
        match self.status(true).await {
            Ok(status) => Ok(status.power_state()),
            Err(Error::Timeout) => Ok(PowerState::Off),
            Err(e) => Err(e),
        }
    }

    async fn set_power_state(&self, state: PowerState) -> Result<()> {
        tracing::debug!(state = %state, "Setting power state");
        let mut session = self.session.lock().await;
        match state {
            PowerState::On => {
                if !self.capabilities.has_remote_power_on {
                    return Err(Error::Unsupported(format!(
                        "{} cannot be switched on remotely",
                        self.info.model_name
                    )));
                }
                session
                    .converge_with_pulse(
                        &ConvergeRequest::new("power_on", PowerState::On, POWER_ON_ATTEMPTS),
                        |_: &StatusSnapshot| PowerState::On,
                        PowerState::Off,
                        self.power_on,
                    )
                    .await
                    .map(|_| ())
            }
            PowerState::Off => session.command(&commands::cmd_switch_off()).await,
            PowerState::Standby | PowerState::Operate => {
                Self::converge_operate(&mut session, "set_power_state", state).await
            }
        }
    }

    async fn get_band(&self) -> Result<Band> {
        Ok(self.status(true).await?.band)
    }

    async fn set_band(&self, band: Band) -> Result<()> {
        if !self.capabilities.bands.contains(&band) {
            return Err(Error::InvalidParameter(format!(
                "band {band} not supported by {}",
                self.info.model_name
            )));
        }
        tracing::debug!(band = %band, "Selecting band");
        let budget = self.capabilities.bands.len() as u32;
        self.session
            .lock()
            .await
            .converge(
                &ConvergeRequest::new("set_band", band, budget),
                |s: &StatusSnapshot| s.band,
                |current, target| commands::cmd_band_step(*current, *target),
            )
            .await
            .map(|_| ())
    }

    async fn get_antenna(&self) -> Result<u8> {
        Ok(self.status(true).await?.tx_antenna)
    }

    async fn set_antenna(&self, antenna: u8) -> Result<()> {
        let count = self.capabilities.antenna_count;
        if antenna == 0 || antenna > count {
            return Err(Error::InvalidParameter(format!(
                "antenna {antenna} out of range 1..={count}"
            )));
        }
        tracing::debug!(antenna, "Selecting antenna");
        self.session
            .lock()
            .await
            .converge(
                &ConvergeRequest::new("set_antenna", antenna, u32::from(count)),
                |s: &StatusSnapshot| s.tx_antenna,
                |_, _| commands::cmd_antenna(),
            )
            .await
            .map(|_| ())
    }

    async fn get_input(&self) -> Result<u8> {
        Ok(self.status(true).await?.input)
    }

    async fn set_input(&self, input: u8) -> Result<()> {
        let count = self.capabilities.input_count;
        if input == 0 || input > count {
            return Err(Error::InvalidParameter(format!(
                "input {input} out of range 1..={count}"
            )));
        }
        tracing::debug!(input, "Selecting input");
        self.session
            .lock()
            .await
            .converge(
                &ConvergeRequest::new("set_input", input, u32::from(count)),
                |s: &StatusSnapshot| s.input,
                |_, _| commands::cmd_input(),
            )
            .await
            .map(|_| ())
    }

    async fn get_power_level(&self) -> Result<PowerLevel> {
        Ok(self.status(true).await?.power_level)
    }

    async fn set_power_level(&self, level: PowerLevel) -> Result<()> {
        if !self.capabilities.power_levels.contains(&level) {
            return Err(Error::InvalidParameter(format!(
                "power level {level} not supported"
            )));
        }
        tracing::debug!(level = %level, "Setting power level");
        let budget = self.capabilities.power_levels.len() as u32;
        self.session
            .lock()
            .await
            .converge(
                &ConvergeRequest::new("set_power_level", level, budget),
                |s: &StatusSnapshot| s.power_level,
                |_, _| commands::cmd_power_level(),
            )
            .await
            .map(|_| ())
    }

    async fn get_ptt(&self) -> Result<bool> {
        Ok(self.status(true).await?.transmitting)
    }

    async fn get_meters(&self) -> Result<AmpMeters> {
        let status = self.status(true).await?;
        Ok(AmpMeters {
            output_power_watts: f32::from(status.output_power_watts),
            swr: status.swr_antenna,
            pa_voltage: status.pa_voltage,
            pa_current: status.pa_current,
            temperature_c: f32::from(status.max_temperature_c()),
        })
    }

    async fn get_fault(&self) -> Result<AmpAlert> {
        Ok(self.status(true).await?.alarm.into())
    }

    async fn get_warning(&self) -> Result<AmpAlert> {
        Ok(self.status(true).await?.warning.into())
    }

    async fn tune(&self) -> Result<()> {
        if !self.capabilities.has_atu {
            return Err(Error::Unsupported(format!(
                "{} has no antenna tuner",
                self.info.model_name
            )));
        }
        tracing::debug!("Starting tune cycle");
        self.session
            .lock()
            .await
            .command(&commands::cmd_tune())
            .await
    }

    /// Drop to standby and back to operate, which clears a latched alarm.
    async fn reset(&self) -> Result<()> {
        tracing::debug!("Resetting amplifier");
        let mut session = self.session.lock().await;
        Self::converge_operate(&mut session, "reset", PowerState::Standby).await?;
        Self::converge_operate(&mut session, "reset", PowerState::Operate).await
    }
}
