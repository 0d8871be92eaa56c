//! Amateur radio band identification.
//!
//! Provides a [`Band`] enum covering the HF bands plus 6 m and 4 m, which is
//! the coverage of solid-state HF linear amplifiers. Amplifiers report their
//! selected band rather than a frequency, so the band is the primary unit of
//! state; [`Band::from_freq`] maps a transceiver frequency onto it.
//!
//! # Example
//!
//! ```
//! use amplib_core::Band;
//!
//! let band = Band::from_freq(14_074_000).unwrap();
//! assert_eq!(band, Band::Band20m);
//! assert_eq!(band.to_string(), "20m");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::BandRange;

/// Amateur band as selected on an HF amplifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Band {
    /// 160 meters (1.8–2.0 MHz).
    Band160m,
    /// 80 meters (3.5–4.0 MHz).
    Band80m,
    /// 60 meters (5.3305–5.4035 MHz).
    Band60m,
    /// 40 meters (7.0–7.3 MHz).
    Band40m,
    /// 30 meters (10.1–10.15 MHz).
    Band30m,
    /// 20 meters (14.0–14.35 MHz).
    Band20m,
    /// 17 meters (18.068–18.168 MHz).
    Band17m,
    /// 15 meters (21.0–21.45 MHz).
    Band15m,
    /// 12 meters (24.89–24.99 MHz).
    Band12m,
    /// 10 meters (28.0–29.7 MHz).
    Band10m,
    /// 6 meters (50.0–54.0 MHz).
    Band6m,
    /// 4 meters (70.0–70.5 MHz), Region 1 only.
    Band4m,
}

const ALL_BANDS: &[Band] = &[
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
    Band::Band4m,
];

impl Band {
    /// Returns the band containing the given frequency, or `None` if the
    /// frequency does not fall within any band in this table.
    pub fn from_freq(freq_hz: u64) -> Option<Band> {
        ALL_BANDS
            .iter()
            .copied()
            .find(|band| band.freq_range().contains(freq_hz))
    }

    /// Returns the frequency range (lower and upper edges) for this band.
    pub fn freq_range(&self) -> BandRange {
        match self {
            Band::Band160m => BandRange::new(1_800_000, 2_000_000),
            Band::Band80m => BandRange::new(3_500_000, 4_000_000),
            Band::Band60m => BandRange::new(5_330_500, 5_403_500),
            Band::Band40m => BandRange::new(7_000_000, 7_300_000),
            Band::Band30m => BandRange::new(10_100_000, 10_150_000),
            Band::Band20m => BandRange::new(14_000_000, 14_350_000),
            Band::Band17m => BandRange::new(18_068_000, 18_168_000),
            Band::Band15m => BandRange::new(21_000_000, 21_450_000),
            Band::Band12m => BandRange::new(24_890_000, 24_990_000),
            Band::Band10m => BandRange::new(28_000_000, 29_700_000),
            Band::Band6m => BandRange::new(50_000_000, 54_000_000),
            Band::Band4m => BandRange::new(70_000_000, 70_500_000),
        }
    }

    /// Returns the short band name (e.g. "20m").
    pub fn name(&self) -> &'static str {
        match self {
            Band::Band160m => "160m",
            Band::Band80m => "80m",
            Band::Band60m => "60m",
            Band::Band40m => "40m",
            Band::Band30m => "30m",
            Band::Band20m => "20m",
            Band::Band17m => "17m",
            Band::Band15m => "15m",
            Band::Band12m => "12m",
            Band::Band10m => "10m",
            Band::Band6m => "6m",
            Band::Band4m => "4m",
        }
    }

    /// Returns a slice of all bands in frequency order (lowest first).
    pub fn all() -> &'static [Band] {
        ALL_BANDS
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when a string cannot be parsed into a [`Band`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBandError(String);

impl fmt::Display for ParseBandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown band: '{}'", self.0)
    }
}

impl std::error::Error for ParseBandError {}

impl FromStr for Band {
    type Err = ParseBandError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "160m" | "160" => Ok(Band::Band160m),
            "80m" | "80" => Ok(Band::Band80m),
            "60m" | "60" => Ok(Band::Band60m),
            "40m" | "40" => Ok(Band::Band40m),
            "30m" | "30" => Ok(Band::Band30m),
            "20m" | "20" => Ok(Band::Band20m),
            "17m" | "17" => Ok(Band::Band17m),
            "15m" | "15" => Ok(Band::Band15m),
            "12m" | "12" => Ok(Band::Band12m),
            "10m" | "10" => Ok(Band::Band10m),
            "6m" | "6" => Ok(Band::Band6m),
            "4m" | "4" => Ok(Band::Band4m),
            _ => Err(ParseBandError(s.to_string())),
        }
    }
}
