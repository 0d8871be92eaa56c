//! Core types used throughout amplib.
//!
//! These types provide a manufacturer-agnostic view of a linear amplifier:
//! identity, capabilities, power and operate state, meter readings, and
//! fault/warning reports.

use std::fmt;
use std::str::FromStr;

use crate::band::Band;

/// Amplifier manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Manufacturer {
    /// SPE (Expert 1.3K-FA, 1.5K-FA, 2K-FA).
    Spe,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Manufacturer::Spe => write!(f, "SPE"),
        }
    }
}

/// How the amplifier connects to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    /// Serial port (USB virtual COM or RS-232).
    Serial,
    /// Serial tunneled over a TCP bridge.
    Network,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Serial => write!(f, "Serial"),
            ConnectionType::Network => write!(f, "Network"),
        }
    }
}

/// Modem control line on a serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    /// Data Terminal Ready.
    Dtr,
    /// Request To Send.
    Rts,
}

impl fmt::Display for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlLine::Dtr => write!(f, "DTR"),
            ControlLine::Rts => write!(f, "RTS"),
        }
    }
}

/// A contiguous frequency range, typically corresponding to a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRange {
    /// Lower bound of the range in hertz (inclusive).
    pub low_hz: u64,
    /// Upper bound of the range in hertz (inclusive).
    pub high_hz: u64,
}

impl BandRange {
    /// Create a new band range.
    pub fn new(low_hz: u64, high_hz: u64) -> Self {
        BandRange { low_hz, high_hz }
    }

    /// Check whether a frequency (in hertz) falls within this range (inclusive).
    pub fn contains(&self, freq_hz: u64) -> bool {
        freq_hz >= self.low_hz && freq_hz <= self.high_hz
    }
}

impl fmt::Display for BandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} Hz", self.low_hz, self.high_hz)
    }
}

/// Mains power and operate/standby state.
///
/// `On` is only used as a request ("power up, whichever state the amplifier
/// comes up in"); queries report `Off`, `Standby`, or `Operate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerState {
    /// Mains power off; the amplifier does not answer.
    Off,
    /// Powered; operate/standby unspecified.
    On,
    /// Powered, bypassed (exciter passes straight through).
    Standby,
    /// Powered and amplifying.
    Operate,
}

impl PowerState {
    /// Returns `true` if the amplifier is powered in any state.
    pub fn is_on(&self) -> bool {
        !matches!(self, PowerState::Off)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::Off => "off",
            PowerState::On => "on",
            PowerState::Standby => "standby",
            PowerState::Operate => "operate",
        };
        write!(f, "{s}")
    }
}

/// Discrete output power level setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PowerLevel {
    Low,
    Mid,
    High,
}

impl fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerLevel::Low => "low",
            PowerLevel::Mid => "mid",
            PowerLevel::High => "high",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string cannot be parsed into a [`PowerLevel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePowerLevelError(String);

impl fmt::Display for ParsePowerLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown power level: '{}'. Expected: low, mid, high", self.0)
    }
}

impl std::error::Error for ParsePowerLevelError {}

impl FromStr for PowerLevel {
    type Err = ParsePowerLevelError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" | "l" => Ok(PowerLevel::Low),
            "mid" | "m" => Ok(PowerLevel::Mid),
            "high" | "h" => Ok(PowerLevel::High),
            _ => Err(ParsePowerLevelError(s.to_string())),
        }
    }
}

/// Meter readings reported by the amplifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmpMeters {
    /// Forward output power in watts.
    pub output_power_watts: f32,
    /// SWR at the antenna connector.
    pub swr: f32,
    /// PA supply voltage in volts.
    pub pa_voltage: f32,
    /// PA current in amperes.
    pub pa_current: f32,
    /// Hottest reported heatsink temperature in degrees Celsius.
    pub temperature_c: f32,
}

/// A fault or warning condition reported by the amplifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmpAlert {
    /// The raw wire code.
    pub code: u8,
    /// Whether the code denotes an active condition (false for "none").
    pub active: bool,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for AmpAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Static information about a connected amplifier.
#[derive(Debug, Clone)]
pub struct AmpInfo {
    /// The manufacturer of the amplifier.
    pub manufacturer: Manufacturer,
    /// Human-readable model name (e.g. "2K-FA").
    pub model_name: String,
    /// Machine-readable model identifier as reported on the wire.
    pub model_id: String,
    /// How this handle reaches the amplifier.
    pub connection: ConnectionType,
}

/// Capabilities and limits of a specific amplifier model.
#[derive(Debug, Clone)]
pub struct AmpCapabilities {
    /// Number of selectable antenna ports (1-based indices).
    pub antenna_count: u8,
    /// Number of selectable exciter inputs (1-based indices).
    pub input_count: u8,
    /// Bands the amplifier can be set to, lowest first.
    pub bands: Vec<Band>,
    /// Discrete power level settings, in toggle order.
    pub power_levels: Vec<PowerLevel>,
    /// Maximum rated output power in watts.
    pub max_power_watts: f32,
    /// Whether the amplifier has a built-in antenna tuner.
    pub has_atu: bool,
    /// Whether the amplifier can be switched on from the host.
    pub has_remote_power_on: bool,
}

impl Default for AmpCapabilities {
    fn default() -> Self {
        AmpCapabilities {
            antenna_count: 1,
            input_count: 1,
            bands: Vec::new(),
            power_levels: Vec::new(),
            max_power_watts: 0.0,
            has_atu: false,
            has_remote_power_on: false,
        }
    }
}

/// A supported amplifier model with enough information for a UI picker.
///
/// Obtained via `amplib::supported_amps()` (facade crate) or by converting
/// a manufacturer-specific model type via its `From` implementation.
#[derive(Debug, Clone)]
pub struct AmpDefinition {
    /// The manufacturer of the amplifier.
    pub manufacturer: Manufacturer,
    /// Human-readable model name.
    pub model_name: &'static str,
    /// How the amplifier connects to the host.
    pub connection: ConnectionType,
    /// Default serial baud rate.
    pub default_baud_rate: Option<u32>,
    /// Full capability description for this model.
    pub capabilities: AmpCapabilities,
}
