//! Formatting helpers for protocol diagnostics.

/// Format bytes as space-separated uppercase hex pairs.
///
/// Protocol errors carry the raw bytes that triggered them; this is the
/// form in which they are logged.
///
/// # Example
///
/// ```
/// use amplib_core::hex_dump;
///
/// assert_eq!(hex_dump(&[0xAA, 0xAA, 0xAA, 0x43]), "AA AA AA 43");
/// assert_eq!(hex_dump(&[]), "");
/// ```
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{b:02X}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_dump_single_byte() {
        assert_eq!(hex_dump(&[0x0A]), "0A");
    }

    #[test]
    fn hex_dump_frame() {
        assert_eq!(hex_dump(&[0x55, 0x55, 0x55, 0x01, 0x90, 0x90]), "55 55 55 01 90 90");
    }

    #[test]
    fn hex_dump_empty() {
        assert_eq!(hex_dump(&[]), "");
    }
}
