//! Request/response transaction engine.
//!
//! [`TransactionEngine`] owns one [`Transport`] and runs exactly one framed
//! exchange at a time: discard stale input, write the encoded command, then
//! read either a fixed-size acknowledgement or a length-prefixed response.
//! All reads of one transaction share a single deadline.
//!
//! The engine never retries; retry policy belongs to the callers
//! ([`session`](crate::session), [`converge`](crate::converge)).

use std::time::Duration;

use amplib_core::error::{Error, Result};
use amplib_core::helpers::hex_dump;
use amplib_core::transport::Transport;
use amplib_core::types::ControlLine;
use tokio::time::Instant;

use crate::codec::{Command, FrameCodec, Payload};

/// A timed assert-hold-release of a modem control line, followed by a
/// settle delay before the device is expected to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePulse {
    pub line: ControlLine,
    pub hold: Duration,
    pub settle: Duration,
}

/// Serial transaction engine for one device handle.
pub struct TransactionEngine {
    transport: Box<dyn Transport>,
    codec: FrameCodec,
    command_timeout: Duration,
}

impl TransactionEngine {
    pub fn new(transport: Box<dyn Transport>, codec: FrameCodec, command_timeout: Duration) -> Self {
        TransactionEngine {
            transport,
            codec,
            command_timeout,
        }
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.command_timeout = timeout;
    }

    /// Run one exchange.
    ///
    /// With `expect_response == false` the device must answer with an
    /// acknowledgement echoing the command's opcode and the returned payload
    /// is empty. Otherwise the declared-length response payload is returned.
    ///
    /// Errors:
    /// - [`Error::Timeout`] if the device sent nothing before the deadline
    /// - [`Error::Protocol`] for bad sync, length, checksum, trailer or ack,
    ///   including a response cut short by the deadline
    /// - transport errors as reported by the [`Transport`]
    pub async fn transact(&mut self, command: &Command, expect_response: bool) -> Result<Payload> {
        // Acknowledgements are matched by opcode.
        let opcode = command
            .opcode()
            .ok_or_else(|| Error::Encoding("empty command".into()))?;
        let frame = self.codec.encode(command)?;

        self.transport.discard_input().await?;

        tracing::trace!(opcode, frame = %hex_dump(&frame), "Sending frame");
        self.transport.send(&frame).await?;

        let deadline = Instant::now() + self.command_timeout;

        if !expect_response {
            let mut ack = vec![0u8; self.codec.ack_len()];
            let n = self.read_exact(&mut ack, deadline).await?;
            if n == 0 {
                tracing::debug!(opcode, "No acknowledgement before deadline");
                return Err(Error::Timeout);
            }
            tracing::trace!(opcode, ack = %hex_dump(&ack[..n]), "Received ack");
            self.codec
                .decode_ack(opcode, &ack[..n])
                .map_err(|e| {
                    tracing::warn!(opcode, error = %e, "Bad acknowledgement");
                    e
                })?;
            tracing::debug!(opcode, "Command acknowledged");
            return Ok(Payload::new());
        }

        let mut header = vec![0u8; self.codec.header_len()];
        let n = self.read_exact(&mut header, deadline).await?;
        if n == 0 {
            tracing::debug!(opcode, "No response before deadline");
            return Err(Error::Timeout);
        }
        let declared = self
            .codec
            .decode_header(&header[..n])
            .map_err(|e| {
                tracing::warn!(opcode, error = %e, "Bad response header");
                e
            })?;

        let mut body = vec![0u8; self.codec.body_len(declared)];
        let n = self.read_exact(&mut body, deadline).await?;
        tracing::trace!(
            opcode,
            header = %hex_dump(&header),
            body = %hex_dump(&body[..n]),
            "Received response"
        );
        let payload = self
            .codec
            .decode_body(&body[..n], declared)
            .map_err(|e| {
                tracing::warn!(opcode, error = %e, "Bad response body");
                e
            })?;

        tracing::debug!(opcode, payload_len = payload.len(), "Response validated");
        Ok(payload)
    }

    /// Pulse a control line: assert, hold, release, then wait to settle.
    ///
    /// If asserting fails the line is left alone; if releasing fails the
    /// error is returned after logging.
    pub async fn pulse_line(&mut self, pulse: &LinePulse) -> Result<()> {
        tracing::debug!(
            line = %pulse.line,
            hold_ms = pulse.hold.as_millis(),
            settle_ms = pulse.settle.as_millis(),
            "Pulsing control line"
        );
        self.transport.set_control_line(pulse.line, true).await?;
        tokio::time::sleep(pulse.hold).await;
        self.transport
            .set_control_line(pulse.line, false)
            .await
            .map_err(|e| {
                tracing::warn!(line = %pulse.line, error = %e, "Failed to release line");
                e
            })?;
        tokio::time::sleep(pulse.settle).await;
        Ok(())
    }

    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn has_control_lines(&self) -> bool {
        self.transport.has_control_lines()
    }

    /// Fill `buf` from the transport until it is full or `deadline` passes.
    ///
    /// Returns how many bytes arrived; a short count is not an error here so
    /// that the codec can report it with the bytes that did arrive.
    async fn read_exact(&mut self, buf: &mut [u8], deadline: Instant) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.transport.receive(&mut buf[filled..], remaining).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Checksum, ChecksumCoverage, FrameFormat, FrameLayout};
    use amplib_core::error::ProtocolErrorKind;
    use amplib_test_harness::MockTransport;

    const FORMAT: FrameFormat = FrameFormat {
        request: FrameLayout {
            sync: &[0x55, 0x55, 0x55],
            checksum: Checksum::Sum8,
            coverage: ChecksumCoverage::Payload,
            trailer: &[],
        },
        response: FrameLayout {
            sync: &[0xAA, 0xAA, 0xAA],
            checksum: Checksum::Sum16Le,
            coverage: ChecksumCoverage::Payload,
            trailer: b",\r\n",
        },
        max_payload: 16,
    };

    const CODEC: FrameCodec = FrameCodec::new(FORMAT);

    fn engine(mock: &MockTransport) -> TransactionEngine {
        TransactionEngine::new(Box::new(mock.clone()), CODEC, Duration::from_millis(200))
    }

    fn request(opcode: u8) -> Vec<u8> {
        CODEC.encode(&Command::new(opcode)).unwrap()
    }

    #[tokio::test]
    async fn response_transaction_returns_payload() {
        let mock = MockTransport::new();
        mock.expect(&request(0x90), &CODEC.encode_response(b",20K,S,").unwrap());

        let payload = engine(&mock)
            .transact(&Command::new(0x90), true)
            .await
            .unwrap();
        assert_eq!(payload, &b",20K,S,"[..]);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn ack_transaction_returns_empty_payload() {
        let mock = MockTransport::new();
        mock.expect(&request(0x04), &CODEC.encode_ack(0x04));

        let payload = engine(&mock)
            .transact(&Command::new(0x04), false)
            .await
            .unwrap();
        assert!(payload.is_empty());
    }

    #[tokio::test]
    async fn stale_input_is_discarded_before_sending() {
        let mock = MockTransport::new();
        mock.inject_stale(&[0xAA, 0xAA, 0xAA, 0x43, 0x2C]);
        mock.expect(&request(0x0D), &CODEC.encode_ack(0x0D));

        engine(&mock)
            .transact(&Command::new(0x0D), false)
            .await
            .unwrap();
        assert_eq!(mock.discard_count(), 1);
        assert_eq!(mock.discarded_bytes(), 5);
    }

    #[tokio::test]
    async fn silence_is_timeout() {
        let mock = MockTransport::new();
        mock.expect_silence(&request(0x90));

        let err = engine(&mock)
            .transact(&Command::new(0x90), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn missing_ack_is_timeout() {
        let mock = MockTransport::new();
        mock.expect_silence(&request(0x0B));

        let err = engine(&mock)
            .transact(&Command::new(0x0B), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout));
    }

    #[tokio::test]
    async fn truncated_response_is_length_mismatch() {
        let mock = MockTransport::new();
        let full = CODEC.encode_response(b"abcdef").unwrap();
        mock.expect(&request(0x90), &full[..full.len() - 4]);

        let err = engine(&mock)
            .transact(&Command::new(0x90), true)
            .await
            .unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::LengthMismatch {
                expected: 11,
                actual: 7
            })
        );
    }

    #[tokio::test]
    async fn header_only_is_length_mismatch_not_timeout() {
        let mock = MockTransport::new();
        mock.expect(&request(0x90), &[0xAA, 0xAA, 0xAA, 0x02]);

        let err = engine(&mock)
            .transact(&Command::new(0x90), true)
            .await
            .unwrap_err();
        assert!(matches!(
            err.protocol_kind(),
            Some(ProtocolErrorKind::LengthMismatch { actual: 0, .. })
        ));
    }

    #[tokio::test]
    async fn corrupted_response_is_checksum_failure() {
        let mock = MockTransport::new();
        let mut frame = CODEC.encode_response(b"abc").unwrap();
        frame[5] ^= 0x01;
        mock.expect(&request(0x90), &frame);

        let err = engine(&mock)
            .transact(&Command::new(0x90), true)
            .await
            .unwrap_err();
        assert!(matches!(
            err.protocol_kind(),
            Some(ProtocolErrorKind::ChecksumFailed { .. })
        ));
    }

    #[tokio::test]
    async fn wrong_ack_is_unexpected_ack() {
        let mock = MockTransport::new();
        mock.expect(&request(0x01), &CODEC.encode_ack(0x04));

        let err = engine(&mock)
            .transact(&Command::new(0x01), false)
            .await
            .unwrap_err();
        assert_eq!(
            err.protocol_kind(),
            Some(&ProtocolErrorKind::UnexpectedAck {
                expected: 0x01,
                actual: 0x04
            })
        );
    }

    #[tokio::test]
    async fn encoding_failure_sends_nothing() {
        let mock = MockTransport::new();
        let err = engine(&mock)
            .transact(&Command::from_bytes(vec![0u8; 40]), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert!(mock.sent_data().is_empty());
        assert_eq!(mock.discard_count(), 0);
    }

    #[tokio::test]
    async fn empty_command_is_rejected_before_sending() {
        let mock = MockTransport::new();
        let err = engine(&mock)
            .transact(&Command::from_bytes(Vec::new()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn failed_send_is_reported_unchanged_and_not_repeated() {
        let mock = MockTransport::new();
        mock.expect(&request(0x90), &CODEC.encode_response(b",20K,").unwrap());
        mock.fail_next_send(Error::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "short write",
        )));

        let err = engine(&mock)
            .transact(&Command::new(0x90), true)
            .await
            .unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("expected Io, got {other:?}"),
        }
        assert_eq!(mock.sent_data(), vec![request(0x90)]);
        assert_eq!(mock.remaining_expectations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pulse_line_asserts_then_releases() {
        let mock = MockTransport::new();
        let pulse = LinePulse {
            line: ControlLine::Dtr,
            hold: Duration::from_millis(300),
            settle: Duration::from_secs(2),
        };

        let start = Instant::now();
        engine(&mock).pulse_line(&pulse).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(2300));
        assert_eq!(
            mock.control_line_events(),
            vec![(ControlLine::Dtr, true), (ControlLine::Dtr, false)]
        );
    }

    #[tokio::test]
    async fn pulse_line_without_control_lines_is_unsupported() {
        let mock = MockTransport::new();
        mock.set_control_lines_supported(false);
        let pulse = LinePulse {
            line: ControlLine::Rts,
            hold: Duration::from_millis(1),
            settle: Duration::from_millis(1),
        };

        let err = engine(&mock).pulse_line(&pulse).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(mock.control_line_events().is_empty());
    }
}
