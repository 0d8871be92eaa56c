//! SPE Expert status frame decoding.
//!
//! The status payload is fixed-position, comma-separated ASCII:
//!
//! ```text
//! ,13K,S,R,A,1,10,1a,0r,L,0000, 0.00, 0.00, 0.0, 0.0, 33,000,000,N,N,
//!  ID  | | | | BB TA RA P PPPP SWR   SWR   VPA  IPA  T1  T2  T3  W F
//!      | | | input
//!      | | memory bank
//!      | RX/TX
//!      standby/operate
//! ```
//!
//! Code fields (state, RX/TX, bank, power level) must be known values.
//! Warning and alarm codes never fail decoding: an unknown code is reported
//! with a synthesized message. An unknown band code is an
//! `UnknownBand` protocol error.

use std::fmt;

use amplib_core::error::{Error, ProtocolErrorKind, Result};
use amplib_core::types::{AmpAlert, PowerLevel, PowerState};
use amplib_core::Band;
use amplib_frame_io::{parse_char, parse_number, ByteField, Field, StatusDecoder};

/// Standby or operate, as reported by the amplifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperateState {
    Standby,
    Operate,
}

impl OperateState {
    fn from_code(c: char) -> Option<Self> {
        match c {
            'S' => Some(OperateState::Standby),
            'O' => Some(OperateState::Operate),
            _ => None,
        }
    }
}

impl From<OperateState> for PowerState {
    fn from(state: OperateState) -> Self {
        match state {
            OperateState::Standby => PowerState::Standby,
            OperateState::Operate => PowerState::Operate,
        }
    }
}

/// Which of the two memory banks (antenna/band configurations) is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryBank {
    A,
    B,
}

impl MemoryBank {
    fn from_code(c: char) -> Option<Self> {
        match c {
            'A' => Some(MemoryBank::A),
            'B' => Some(MemoryBank::B),
            _ => None,
        }
    }
}

/// Tuner state reported next to the TX antenna.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtuStatus {
    /// Tuner in line (`a`).
    Enabled,
    /// Tuner bypassed (`b`).
    Bypassed,
    /// Antenna marked tunable, no stored match (`t`).
    Tunable,
    Other(char),
}

impl AtuStatus {
    fn from_code(c: char) -> Self {
        match c {
            'a' => AtuStatus::Enabled,
            'b' => AtuStatus::Bypassed,
            't' => AtuStatus::Tunable,
            other => AtuStatus::Other(other),
        }
    }
}

fn power_level_from_code(c: char) -> Option<PowerLevel> {
    match c {
        'L' => Some(PowerLevel::Low),
        'M' => Some(PowerLevel::Mid),
        'H' => Some(PowerLevel::High),
        _ => None,
    }
}

/// Band selected on the amplifier, by two-digit wire code.
pub fn band_from_code(code: &str) -> Option<Band> {
    let band = match code {
        "00" => Band::Band160m,
        "01" => Band::Band80m,
        "02" => Band::Band60m,
        "03" => Band::Band40m,
        "04" => Band::Band30m,
        "05" => Band::Band20m,
        "06" => Band::Band17m,
        "07" => Band::Band15m,
        "08" => Band::Band12m,
        "09" => Band::Band10m,
        "10" => Band::Band6m,
        "11" => Band::Band4m,
        _ => return None,
    };
    Some(band)
}

/// Warning condition (the amplifier keeps operating).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    None,
    AmplifierAlarm,
    NoSelectedAntenna,
    SwrAntenna,
    NoValidBand,
    PowerLimitExceeded,
    Overheating,
    AtuNotAvailable,
    TuningWithNoPower,
    AtuBypassed,
    PowerSwitchHeldByRemote,
    CombinerOverheating,
    CombinerFault,
    Unknown(u8),
}

impl Warning {
    pub fn from_code(code: u8) -> Self {
        match code {
            b'N' => Warning::None,
            b'M' => Warning::AmplifierAlarm,
            b'A' => Warning::NoSelectedAntenna,
            b'S' => Warning::SwrAntenna,
            b'B' => Warning::NoValidBand,
            b'P' => Warning::PowerLimitExceeded,
            b'O' => Warning::Overheating,
            b'Y' => Warning::AtuNotAvailable,
            b'W' => Warning::TuningWithNoPower,
            b'K' => Warning::AtuBypassed,
            b'R' => Warning::PowerSwitchHeldByRemote,
            b'T' => Warning::CombinerOverheating,
            b'C' => Warning::CombinerFault,
            other => Warning::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Warning::None => b'N',
            Warning::AmplifierAlarm => b'M',
            Warning::NoSelectedAntenna => b'A',
            Warning::SwrAntenna => b'S',
            Warning::NoValidBand => b'B',
            Warning::PowerLimitExceeded => b'P',
            Warning::Overheating => b'O',
            Warning::AtuNotAvailable => b'Y',
            Warning::TuningWithNoPower => b'W',
            Warning::AtuBypassed => b'K',
            Warning::PowerSwitchHeldByRemote => b'R',
            Warning::CombinerOverheating => b'T',
            Warning::CombinerFault => b'C',
            Warning::Unknown(code) => *code,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Warning::None)
    }

    pub fn message(&self) -> String {
        let text = match self {
            Warning::None => "no warnings",
            Warning::AmplifierAlarm => "amplifier alarm",
            Warning::NoSelectedAntenna => "no selected antenna",
            Warning::SwrAntenna => "SWR antenna",
            Warning::NoValidBand => "no valid band",
            Warning::PowerLimitExceeded => "power limit exceeded",
            Warning::Overheating => "overheating",
            Warning::AtuNotAvailable => "ATU not available",
            Warning::TuningWithNoPower => "tuning with no power",
            Warning::AtuBypassed => "ATU bypassed",
            Warning::PowerSwitchHeldByRemote => "power switch held by remote",
            Warning::CombinerOverheating => "combiner overheating",
            Warning::CombinerFault => "combiner fault",
            Warning::Unknown(code) => return unknown_code(*code),
        };
        text.to_string()
    }
}

impl From<Warning> for AmpAlert {
    fn from(warning: Warning) -> Self {
        AmpAlert {
            code: warning.code(),
            active: warning.is_active(),
            message: warning.message(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Alarm condition (the amplifier has dropped to standby).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alarm {
    None,
    SwrExceedingLimits,
    AmplifierProtection,
    InputOverdriving,
    ExcessOverheating,
    CombinerFault,
    Unknown(u8),
}

impl Alarm {
    pub fn from_code(code: u8) -> Self {
        match code {
            b'N' => Alarm::None,
            b'S' => Alarm::SwrExceedingLimits,
            b'A' => Alarm::AmplifierProtection,
            b'D' => Alarm::InputOverdriving,
            b'H' => Alarm::ExcessOverheating,
            b'C' => Alarm::CombinerFault,
            other => Alarm::Unknown(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Alarm::None => b'N',
            Alarm::SwrExceedingLimits => b'S',
            Alarm::AmplifierProtection => b'A',
            Alarm::InputOverdriving => b'D',
            Alarm::ExcessOverheating => b'H',
            Alarm::CombinerFault => b'C',
            Alarm::Unknown(code) => *code,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Alarm::None)
    }

    pub fn message(&self) -> String {
        let text = match self {
            Alarm::None => "no alarms",
            Alarm::SwrExceedingLimits => "SWR exceeding limits",
            Alarm::AmplifierProtection => "amplifier protection",
            Alarm::InputOverdriving => "input overdriving",
            Alarm::ExcessOverheating => "excess overheating",
            Alarm::CombinerFault => "combiner fault",
            Alarm::Unknown(code) => return unknown_code(*code),
        };
        text.to_string()
    }
}

impl From<Alarm> for AmpAlert {
    fn from(alarm: Alarm) -> Self {
        AmpAlert {
            code: alarm.code(),
            active: alarm.is_active(),
            message: alarm.message(),
        }
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

fn unknown_code(code: u8) -> String {
    format!("unknown code: {}", code as char)
}

/// Decoded status frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Model identifier as reported (`13K`, `15K`, `20K`).
    pub model_id: String,
    pub operate: OperateState,
    pub transmitting: bool,
    pub bank: MemoryBank,
    pub input: u8,
    pub band: Band,
    pub tx_antenna: u8,
    pub atu: AtuStatus,
    /// Separate receive antenna; 0 when receiving on the TX antenna.
    pub rx_antenna: u8,
    pub power_level: PowerLevel,
    pub output_power_watts: u16,
    pub swr_atu: f32,
    pub swr_antenna: f32,
    pub pa_voltage: f32,
    pub pa_current: f32,
    /// Heatsink and combiner temperatures in degrees Celsius.
    pub temperatures_c: [u16; 3],
    pub warning: Warning,
    pub alarm: Alarm,
}

impl StatusSnapshot {
    pub fn power_state(&self) -> PowerState {
        self.operate.into()
    }

    pub fn max_temperature_c(&self) -> u16 {
        self.temperatures_c.iter().copied().max().unwrap_or(0)
    }
}

fn parse_text(s: &str) -> Option<String> {
    Some(s.to_string())
}

fn parse_operate(s: &str) -> Option<OperateState> {
    parse_char(s).and_then(OperateState::from_code)
}

fn parse_rx_tx(s: &str) -> Option<bool> {
    match parse_char(s)? {
        'R' => Some(false),
        'T' => Some(true),
        _ => None,
    }
}

fn parse_bank(s: &str) -> Option<MemoryBank> {
    parse_char(s).and_then(MemoryBank::from_code)
}

fn parse_atu(s: &str) -> Option<AtuStatus> {
    parse_char(s).map(AtuStatus::from_code)
}

fn parse_power_level(s: &str) -> Option<PowerLevel> {
    parse_char(s).and_then(power_level_from_code)
}

const MODEL_ID: Field<String> = Field::new("model_id", 1, 3, parse_text);
const OPERATE: Field<OperateState> = Field::new("operate", 5, 1, parse_operate);
const RX_TX: Field<bool> = Field::new("rx_tx", 7, 1, parse_rx_tx);
const BANK: Field<MemoryBank> = Field::new("bank", 9, 1, parse_bank);
const INPUT: Field<u8> = Field::new("input", 11, 1, parse_number::<u8>);
const BAND: Field<String> = Field::new("band", 13, 2, parse_text);
const TX_ANTENNA: Field<u8> = Field::new("tx_antenna", 16, 1, parse_number::<u8>);
const ATU: Field<AtuStatus> = Field::new("atu", 17, 1, parse_atu);
const RX_ANTENNA: Field<u8> = Field::new("rx_antenna", 19, 1, parse_number::<u8>);
const POWER_LEVEL: Field<PowerLevel> = Field::new("power_level", 22, 1, parse_power_level);
const OUTPUT_POWER: Field<u16> = Field::new("output_power", 24, 4, parse_number::<u16>);
const SWR_ATU: Field<f32> = Field::new("swr_atu", 29, 5, parse_number::<f32>);
const SWR_ANTENNA: Field<f32> = Field::new("swr_antenna", 35, 5, parse_number::<f32>);
const PA_VOLTAGE: Field<f32> = Field::new("pa_voltage", 41, 4, parse_number::<f32>);
const PA_CURRENT: Field<f32> = Field::new("pa_current", 46, 4, parse_number::<f32>);
const TEMPERATURES: [Field<u16>; 3] = [
    Field::new("temperature_upper", 51, 3, parse_number::<u16>),
    Field::new("temperature_lower", 55, 3, parse_number::<u16>),
    Field::new("temperature_combiner", 59, 3, parse_number::<u16>),
];
const WARNING: ByteField = ByteField::new("warning", 63);
const ALARM: ByteField = ByteField::new("alarm", 65);

/// [`StatusDecoder`] for the Expert status frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeDecoder;

impl StatusDecoder for SpeDecoder {
    type Snapshot = StatusSnapshot;

    fn decode(&self, payload: &[u8]) -> Result<StatusSnapshot> {
        let band_code = BAND.read(payload)?;
        let band = band_from_code(&band_code).ok_or_else(|| {
            Error::protocol(
                ProtocolErrorKind::UnknownBand {
                    code: band_code.clone(),
                },
                band_code.as_bytes(),
            )
        })?;

        Ok(StatusSnapshot {
            model_id: MODEL_ID.read(payload)?,
            operate: OPERATE.read(payload)?,
            transmitting: RX_TX.read(payload)?,
            bank: BANK.read(payload)?,
            input: INPUT.read(payload)?,
            band,
            tx_antenna: TX_ANTENNA.read(payload)?,
            atu: ATU.read(payload)?,
            rx_antenna: RX_ANTENNA.read(payload)?,
            power_level: POWER_LEVEL.read(payload)?,
            output_power_watts: OUTPUT_POWER.read(payload)?,
            swr_atu: SWR_ATU.read(payload)?,
            swr_antenna: SWR_ANTENNA.read(payload)?,
            pa_voltage: PA_VOLTAGE.read(payload)?,
            pa_current: PA_CURRENT.read(payload)?,
            temperatures_c: [
                TEMPERATURES[0].read(payload)?,
                TEMPERATURES[1].read(payload)?,
                TEMPERATURES[2].read(payload)?,
            ],
            warning: Warning::from_code(WARNING.read(payload)?),
            alarm: Alarm::from_code(ALARM.read(payload)?),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{payload, IDLE};
    use super::*;

    #[test]
    fn decodes_idle_frame() {
        let snap = SpeDecoder.decode(IDLE).unwrap();
        assert_eq!(snap.model_id, "13K");
        assert_eq!(snap.operate, OperateState::Standby);
        assert!(!snap.transmitting);
        assert_eq!(snap.bank, MemoryBank::A);
        assert_eq!(snap.input, 1);
        assert_eq!(snap.band, Band::Band6m);
        assert_eq!(snap.tx_antenna, 1);
        assert_eq!(snap.atu, AtuStatus::Enabled);
        assert_eq!(snap.rx_antenna, 0);
        assert_eq!(snap.power_level, PowerLevel::Low);
        assert_eq!(snap.output_power_watts, 0);
        assert_eq!(snap.swr_antenna, 0.0);
        assert_eq!(snap.temperatures_c, [33, 0, 0]);
        assert_eq!(snap.warning, Warning::None);
        assert_eq!(snap.alarm, Alarm::None);
        assert_eq!(snap.power_state(), PowerState::Standby);
    }

    #[test]
    fn decodes_transmitting_frame() {
        let frame = payload(&[
            (1, b"20K"),
            (5, b"O"),
            (7, b"T"),
            (9, b"B"),
            (11, b"2"),
            (13, b"05"),
            (16, b"3t"),
            (19, b"2"),
            (22, b"H"),
            (24, b"1450"),
            (29, b" 1.12"),
            (35, b" 1.35"),
            (41, b"48.5"),
            (46, b"42.1"),
            (51, b" 41"),
            (55, b" 39"),
            (59, b" 45"),
        ]);
        let snap = SpeDecoder.decode(&frame).unwrap();
        assert_eq!(snap.model_id, "20K");
        assert_eq!(snap.power_state(), PowerState::Operate);
        assert!(snap.transmitting);
        assert_eq!(snap.bank, MemoryBank::B);
        assert_eq!(snap.input, 2);
        assert_eq!(snap.band, Band::Band20m);
        assert_eq!(snap.tx_antenna, 3);
        assert_eq!(snap.atu, AtuStatus::Tunable);
        assert_eq!(snap.rx_antenna, 2);
        assert_eq!(snap.power_level, PowerLevel::High);
        assert_eq!(snap.output_power_watts, 1450);
        assert!((snap.swr_atu - 1.12).abs() < 1e-6);
        assert!((snap.swr_antenna - 1.35).abs() < 1e-6);
        assert!((snap.pa_voltage - 48.5).abs() < 1e-6);
        assert!((snap.pa_current - 42.1).abs() < 1e-6);
        assert_eq!(snap.max_temperature_c(), 45);
    }

    #[test]
    fn every_band_code_maps() {
        let expected = [
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
        for (index, band) in expected.iter().enumerate() {
            let code = format!("{index:02}");
            let snap = SpeDecoder
                .decode(&payload(&[(13, code.as_bytes())]))
                .unwrap();
            assert_eq!(snap.band, *band, "code {code}");
        }
    }

    #[test]
    fn unknown_band_code_is_rejected() {
        let err = SpeDecoder.decode(&payload(&[(13, b"12")])).unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::UnknownBand { code: "12".into() })
        );
    }

    #[test]
    fn every_warning_and_alarm_code_decodes() {
        for code in 0u8..=255 {
            let snap = SpeDecoder
                .decode(&payload(&[(63, &[code]), (65, &[code])]))
                .unwrap();
            assert_eq!(snap.warning.code(), code);
            assert_eq!(snap.alarm.code(), code);
            assert!(!snap.warning.message().is_empty());
            assert!(!snap.alarm.message().is_empty());
        }
    }

    #[test]
    fn unknown_codes_get_synthesized_messages() {
        let snap = SpeDecoder
            .decode(&payload(&[(63, b"Z"), (65, b"Q")]))
            .unwrap();
        assert_eq!(snap.warning, Warning::Unknown(b'Z'));
        assert_eq!(snap.warning.message(), "unknown code: Z");
        assert_eq!(snap.alarm.message(), "unknown code: Q");

        let alert: AmpAlert = snap.alarm.into();
        assert!(alert.active);
        assert_eq!(alert.code, b'Q');
    }

    #[test]
    fn known_codes_have_table_messages() {
        assert_eq!(Warning::from_code(b'O').message(), "overheating");
        assert_eq!(Warning::from_code(b'R').message(), "power switch held by remote");
        assert_eq!(Alarm::from_code(b'D').message(), "input overdriving");

        let none: AmpAlert = Alarm::None.into();
        assert!(!none.active);
        assert_eq!(none.message, "no alarms");
    }

    #[test]
    fn unknown_state_code_fails_the_field() {
        let err = SpeDecoder.decode(&payload(&[(5, b"X")])).unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::FieldParseFailed { field: "operate" })
        );

        let err = SpeDecoder.decode(&payload(&[(22, b"Q")])).unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::FieldParseFailed {
                field: "power_level"
            })
        );
    }

    #[test]
    fn malformed_meter_fails_the_field() {
        let err = SpeDecoder.decode(&payload(&[(24, b"1a50")])).unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::FieldParseFailed {
                field: "output_power"
            })
        );
    }

    #[test]
    fn signed_or_exponent_numbers_fail_the_field() {
        let cases: [(usize, &[u8], &str); 4] = [
            (24, b"+150", "output_power"),
            (35, b"-1.00", "swr_antenna"),
            (41, b" NaN", "pa_voltage"),
            (29, b"  1e1", "swr_atu"),
        ];
        for (offset, bytes, field) in cases {
            let err = SpeDecoder
                .decode(&payload(&[(offset, bytes)]))
                .unwrap_err();
            assert_eq!(
                err.protocol_kind(),
                Some(&ProtocolErrorKind::FieldParseFailed { field }),
                "{}",
                String::from_utf8_lossy(bytes)
            );
        }
    }

    #[test]
    fn short_payload_fails_on_first_missing_field() {
        let err = SpeDecoder.decode(&IDLE[..40]).unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::FieldParseFailed { field: "pa_voltage" })
        );
    }

    #[test]
    fn unknown_atu_character_is_tolerated() {
        let snap = SpeDecoder.decode(&payload(&[(17, b"x")])).unwrap();
        assert_eq!(snap.atu, AtuStatus::Other('x'));
    }
}
