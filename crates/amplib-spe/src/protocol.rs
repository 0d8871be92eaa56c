//! SPE Expert serial frame format.
//!
//! ```text
//! request:  0x55 0x55 0x55 <LEN> <PAYLOAD...> <SUM8>
//! response: 0xAA 0xAA 0xAA <LEN> <PAYLOAD...> <SUM16 lo> <SUM16 hi> ',' CR LF
//! ack:      0xAA 0xAA 0xAA 0x01 <OPCODE> <OPCODE>
//! ```
//!
//! Both checksums cover the payload only. Status payloads are 67 bytes of
//! comma-separated ASCII; see [`status`](crate::status).

use amplib_frame_io::{Checksum, ChecksumCoverage, FrameCodec, FrameFormat, FrameLayout};

pub const REQUEST_SYNC: &[u8] = &[0x55, 0x55, 0x55];
pub const RESPONSE_SYNC: &[u8] = &[0xAA, 0xAA, 0xAA];
pub const RESPONSE_TRAILER: &[u8] = b",\r\n";

/// Declared length of a status response payload.
pub const STATUS_PAYLOAD_LEN: usize = 0x43;

pub const REQUEST_LAYOUT: FrameLayout = FrameLayout {
    sync: REQUEST_SYNC,
    checksum: Checksum::Sum8,
    coverage: ChecksumCoverage::Payload,
    trailer: &[],
};

pub const RESPONSE_LAYOUT: FrameLayout = FrameLayout {
    sync: RESPONSE_SYNC,
    checksum: Checksum::Sum16Le,
    coverage: ChecksumCoverage::Payload,
    trailer: RESPONSE_TRAILER,
};

pub const FRAME_FORMAT: FrameFormat = FrameFormat {
    request: REQUEST_LAYOUT,
    response: RESPONSE_LAYOUT,
    max_payload: 8,
};

/// Codec for every SPE Expert model.
pub const CODEC: FrameCodec = FrameCodec::new(FRAME_FORMAT);

#[cfg(test)]
mod tests {
    use super::*;
    use amplib_frame_io::Command;

    #[test]
    fn status_request_bytes() {
        let frame = CODEC.encode(&Command::new(0x90)).unwrap();
        assert_eq!(frame, vec![0x55, 0x55, 0x55, 0x01, 0x90, 0x90]);
    }

    #[test]
    fn status_response_sizes() {
        assert_eq!(CODEC.header_len(), 4);
        // 67 payload + 2 checksum + ',' + CR LF
        assert_eq!(CODEC.body_len(STATUS_PAYLOAD_LEN), 72);
        assert_eq!(CODEC.ack_len(), 6);
    }
}
