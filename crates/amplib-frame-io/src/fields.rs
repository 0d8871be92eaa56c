//! Table-driven extraction of fixed-width fields from status payloads.
//!
//! A backend describes its status layout as a set of [`Field`] descriptors
//! (name, byte offset, width, parser) and implements [`StatusDecoder`] by
//! reading each one. Any short or unparsable field becomes
//! `ProtocolErrorKind::FieldParseFailed` naming the field.

use amplib_core::error::{Error, ProtocolErrorKind, Result};
use std::str::FromStr;

/// One fixed-position field of a status payload.
#[derive(Debug, Clone, Copy)]
pub struct Field<T> {
    pub name: &'static str,
    pub offset: usize,
    pub width: usize,
    pub parse: fn(&str) -> Option<T>,
}

impl<T> Field<T> {
    pub const fn new(
        name: &'static str,
        offset: usize,
        width: usize,
        parse: fn(&str) -> Option<T>,
    ) -> Self {
        Field {
            name,
            offset,
            width,
            parse,
        }
    }

    /// Extract and parse this field from `payload`.
    pub fn read(&self, payload: &[u8]) -> Result<T> {
        let fail = |bytes: &[u8]| {
            Error::protocol(ProtocolErrorKind::FieldParseFailed { field: self.name }, bytes)
        };
        let raw = payload
            .get(self.offset..self.offset + self.width)
            .ok_or_else(|| fail(payload.get(self.offset..).unwrap_or_default()))?;
        let text = std::str::from_utf8(raw).map_err(|_| fail(raw))?;
        (self.parse)(text).ok_or_else(|| fail(raw))
    }
}

/// A one-byte code field whose every value is meaningful, so only a
/// missing byte is an error.
#[derive(Debug, Clone, Copy)]
pub struct ByteField {
    pub name: &'static str,
    pub offset: usize,
}

impl ByteField {
    pub const fn new(name: &'static str, offset: usize) -> Self {
        ByteField { name, offset }
    }

    pub fn read(&self, payload: &[u8]) -> Result<u8> {
        payload.get(self.offset).copied().ok_or_else(|| {
            Error::protocol(ProtocolErrorKind::FieldParseFailed { field: self.name }, payload)
        })
    }
}

/// Parse a right-aligned ASCII number; leading spaces are padding.
///
/// Only digits and at most one decimal point are accepted. Signs,
/// exponents, `inf` and `NaN` are rejected even where `T::from_str` would
/// take them. Integer targets reject the decimal point through `T`.
pub fn parse_number<T: FromStr>(s: &str) -> Option<T> {
    let digits = s.trim_start_matches(' ');
    let mut points = 0;
    let mut seen_digit = false;
    for b in digits.bytes() {
        match b {
            b'0'..=b'9' => seen_digit = true,
            b'.' => points += 1,
            _ => return None,
        }
    }
    if !seen_digit || points > 1 {
        return None;
    }
    digits.parse().ok()
}

/// The single ASCII character of a one-byte field.
pub fn parse_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Turns a validated status payload into a typed snapshot.
pub trait StatusDecoder: Send + Sync {
    type Snapshot: Send + Sync + 'static;

    fn decode(&self, payload: &[u8]) -> Result<Self::Snapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const POWER: Field<u32> = Field::new("output_power", 4, 4, parse_number::<u32>);
    const SWR: Field<f32> = Field::new("swr", 9, 5, parse_number::<f32>);
    const STATE: Field<char> = Field::new("state", 1, 1, parse_char);

    const PAYLOAD: &[u8] = b",S,,0150, 1.35,";

    #[test]
    fn reads_padded_numbers() {
        assert_eq!(POWER.read(PAYLOAD).unwrap(), 150);
        assert!((SWR.read(PAYLOAD).unwrap() - 1.35).abs() < 1e-6);
        assert_eq!(STATE.read(PAYLOAD).unwrap(), 'S');
    }

    #[test]
    fn short_payload_names_the_field() {
        let err = SWR.read(&PAYLOAD[..11]).unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::FieldParseFailed { field: "swr" })
        );
    }

    #[test]
    fn garbage_is_field_parse_failure() {
        let err = POWER.read(b",S,,01x0, 1.35,").unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::FieldParseFailed {
                field: "output_power"
            })
        );
    }

    #[test]
    fn byte_field_accepts_any_byte() {
        const CODE: ByteField = ByteField::new("warning", 2);
        assert_eq!(CODE.read(&[b',', b'N', 0xFF]).unwrap(), 0xFF);
        let err = CODE.read(b",N").unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::FieldParseFailed { field: "warning" })
        );
    }

    #[test]
    fn parse_number_rules() {
        assert_eq!(parse_number::<u32>("  33"), Some(33));
        assert_eq!(parse_number::<u32>("000"), Some(0));
        assert_eq!(parse_number::<u32>("    "), None);
        assert_eq!(parse_number::<u32>("3 3"), None);
        assert_eq!(parse_number::<u32>("33 "), None);
        assert_eq!(parse_number::<f32>(" 0.00"), Some(0.0));
    }

    #[test]
    fn parse_number_is_digits_only() {
        assert_eq!(parse_number::<u32>("+150"), None);
        assert_eq!(parse_number::<f32>("-1.00"), None);
        assert_eq!(parse_number::<f32>(" NaN"), None);
        assert_eq!(parse_number::<f32>(" inf"), None);
        assert_eq!(parse_number::<f32>("  1e1"), None);
        assert_eq!(parse_number::<f32>("1.2.3"), None);
        assert_eq!(parse_number::<f32>("   ."), None);
        assert_eq!(parse_number::<u32>("15.0"), None);
        assert_eq!(parse_number::<f32>(" 48."), Some(48.0));
    }

    #[test]
    fn parse_char_requires_exactly_one() {
        assert_eq!(parse_char("O"), Some('O'));
        assert_eq!(parse_char(""), None);
        assert_eq!(parse_char("OO"), None);
    }
}
