//! SPE Expert model definitions.
//!
//! | Model    | Status ID | Output | Antennas | Inputs |
//! |----------|-----------|--------|----------|--------|
//! | 1.3K-FA  | `13K`     | 1300 W | 2        | 2      |
//! | 1.5K-FA  | `15K`     | 1500 W | 4        | 2      |
//! | 2K-FA    | `20K`     | 2000 W | 4        | 2      |
//!
//! All three share the serial protocol, speak 115200 baud 8N1 over USB,
//! cover 160 m through 6 m (including 60 m), and have a built-in tuner.

use std::time::Duration;

use amplib_core::types::{
    AmpCapabilities, AmpDefinition, ConnectionType, ControlLine, Manufacturer, PowerLevel,
};
use amplib_core::Band;

/// Static description of one Expert model.
#[derive(Debug, Clone)]
pub struct SpeModel {
    /// Human-readable model name (e.g. "1.5K-FA").
    pub name: &'static str,
    /// Identifier the amplifier puts in its status frame.
    pub model_id: &'static str,
    pub default_baud_rate: u32,
    /// Line wired to the remote power-on input.
    pub power_on_line: ControlLine,
    /// How long the power-on line is held asserted.
    pub power_on_pulse: Duration,
    /// Boot time after the pulse before the amplifier answers.
    pub power_on_settle: Duration,
    pub capabilities: AmpCapabilities,
}

impl From<&SpeModel> for AmpDefinition {
    fn from(model: &SpeModel) -> Self {
        AmpDefinition {
            manufacturer: Manufacturer::Spe,
            model_name: model.name,
            connection: ConnectionType::Serial,
            default_baud_rate: Some(model.default_baud_rate),
            capabilities: model.capabilities.clone(),
        }
    }
}

fn hf_6m_bands() -> Vec<Band> {
    vec![
        Band::Band160m,
        Band::Band80m,
        Band::Band60m,
        Band::Band40m,
        Band::Band30m,
        Band::Band20m,
        Band::Band17m,
        Band::Band15m,
        Band::Band12m,
        Band::Band10m,
        Band::Band6m,
    ]
}

fn expert(
    name: &'static str,
    model_id: &'static str,
    max_power_watts: f32,
    antenna_count: u8,
) -> SpeModel {
    SpeModel {
        name,
        model_id,
        default_baud_rate: 115_200,
        power_on_line: ControlLine::Dtr,
        power_on_pulse: Duration::from_millis(500),
        power_on_settle: Duration::from_secs(3),
        capabilities: AmpCapabilities {
            antenna_count,
            input_count: 2,
            bands: hf_6m_bands(),
            power_levels: vec![PowerLevel::Low, PowerLevel::Mid, PowerLevel::High],
            max_power_watts,
            has_atu: true,
            has_remote_power_on: true,
        },
    }
}

/// Expert 1.3K-FA: the compact model with two antenna outputs.
pub fn expert_1_3k_fa() -> SpeModel {
    expert("1.3K-FA", "13K", 1300.0, 2)
}

/// Expert 1.5K-FA.
pub fn expert_1_5k_fa() -> SpeModel {
    expert("1.5K-FA", "15K", 1500.0, 4)
}

/// Expert 2K-FA: the full-size model with the combiner stage.
pub fn expert_2k_fa() -> SpeModel {
    expert("2K-FA", "20K", 2000.0, 4)
}

/// Every supported Expert model.
pub fn all_spe_models() -> Vec<SpeModel> {
    vec![expert_1_3k_fa(), expert_1_5k_fa(), expert_2k_fa()]
}

/// Look up a model by the identifier in its status frame.
pub fn model_by_id(model_id: &str) -> Option<SpeModel> {
    all_spe_models()
        .into_iter()
        .find(|model| model.model_id == model_id)
}
