//! Length-prefixed, checksummed frame encoder/decoder.
//!
//! Every frame on the wire has the shape
//!
//! ```text
//! [SYNC...][LEN][PAYLOAD (LEN bytes)][CHECKSUM][TRAILER...]
//! ```
//!
//! The sync preamble, checksum algorithm and width, checksum coverage, and
//! trailer are parameters of a [`FrameLayout`]; requests and responses may
//! use different layouts (SPE devices answer with a different sync byte and
//! a wider checksum than they accept). A [`FrameFormat`] pairs the two.
//!
//! Acknowledgements are a fixed-size response-direction frame carrying one
//! echo byte and its 8-bit sum:
//!
//! ```text
//! [SYNC...][0x01][ECHO][ECHO]
//! ```
//!
//! Everything here is pure byte manipulation; I/O lives in
//! [`engine`](crate::engine).

use amplib_core::error::{Error, ProtocolErrorKind, Result};
use bytes::{BufMut, Bytes, BytesMut};

/// Payload bytes of a validated response.
pub type Payload = Bytes;

/// A request to the device: an opcode plus optional parameter bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(Bytes);

impl Command {
    /// A command consisting of a single opcode byte.
    pub fn new(opcode: u8) -> Self {
        Command(Bytes::copy_from_slice(&[opcode]))
    }

    /// An opcode followed by parameter bytes.
    pub fn with_params(opcode: u8, params: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(1 + params.len());
        buf.put_u8(opcode);
        buf.put_slice(params);
        Command(buf.freeze())
    }

    /// A command from raw payload bytes, unchecked.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Command(bytes.into())
    }

    /// The leading opcode byte, if any.
    pub fn opcode(&self) -> Option<u8> {
        self.0.first().copied()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Checksum algorithm and on-wire width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checksum {
    /// Sum of the covered bytes modulo 256, one byte.
    Sum8,
    /// Sum modulo 65536, two bytes, least significant first.
    Sum16Le,
    /// Sum modulo 65536, two bytes, most significant first.
    Sum16Be,
}

impl Checksum {
    /// Width of the checksum field in bytes.
    pub const fn width(self) -> usize {
        match self {
            Checksum::Sum8 => 1,
            Checksum::Sum16Le | Checksum::Sum16Be => 2,
        }
    }

    fn compute<'a>(self, chunks: impl IntoIterator<Item = &'a [u8]>) -> u16 {
        let sum = chunks
            .into_iter()
            .flatten()
            .fold(0u16, |acc, &b| acc.wrapping_add(u16::from(b)));
        match self {
            Checksum::Sum8 => sum & 0x00FF,
            Checksum::Sum16Le | Checksum::Sum16Be => sum,
        }
    }

    fn put(self, buf: &mut BytesMut, value: u16) {
        match self {
            Checksum::Sum8 => buf.put_u8(value as u8),
            Checksum::Sum16Le => buf.put_u16_le(value),
            Checksum::Sum16Be => buf.put_u16(value),
        }
    }

    fn read(self, bytes: &[u8]) -> u16 {
        match self {
            Checksum::Sum8 => u16::from(bytes[0]),
            Checksum::Sum16Le => u16::from_le_bytes([bytes[0], bytes[1]]),
            Checksum::Sum16Be => u16::from_be_bytes([bytes[0], bytes[1]]),
        }
    }
}

/// Which bytes the checksum is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumCoverage {
    /// Payload bytes only.
    Payload,
    /// The length byte followed by the payload.
    LengthAndPayload,
}

/// Wire layout of frames travelling in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub sync: &'static [u8],
    pub checksum: Checksum,
    pub coverage: ChecksumCoverage,
    /// Bytes that must follow the checksum exactly (delimiter, terminator).
    pub trailer: &'static [u8],
}

impl FrameLayout {
    fn checksum_of(&self, len: u8, payload: &[u8]) -> u16 {
        let len = [len];
        match self.coverage {
            ChecksumCoverage::Payload => self.checksum.compute([payload]),
            ChecksumCoverage::LengthAndPayload => {
                self.checksum.compute([&len[..], payload])
            }
        }
    }

    fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let len = payload.len() as u8;
        let mut buf = BytesMut::with_capacity(
            self.sync.len() + 1 + payload.len() + self.checksum.width() + self.trailer.len(),
        );
        buf.put_slice(self.sync);
        buf.put_u8(len);
        buf.put_slice(payload);
        self.checksum.put(&mut buf, self.checksum_of(len, payload));
        buf.put_slice(self.trailer);
        buf.to_vec()
    }
}

/// Request and response layouts of one device protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    pub request: FrameLayout,
    pub response: FrameLayout,
    /// Largest payload a request may carry (at most 255).
    pub max_payload: usize,
}

impl FrameFormat {
    /// A format whose requests and responses share one layout.
    pub const fn symmetric(layout: FrameLayout, max_payload: usize) -> Self {
        FrameFormat {
            request: layout,
            response: layout,
            max_payload,
        }
    }
}

/// Encoder/decoder for one [`FrameFormat`].
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    format: FrameFormat,
}

impl FrameCodec {
    pub const fn new(format: FrameFormat) -> Self {
        FrameCodec { format }
    }

    pub fn format(&self) -> &FrameFormat {
        &self.format
    }

    /// Frame a command for transmission.
    ///
    /// Fails with [`Error::Encoding`] only if the command is longer than the
    /// format allows. An empty command frames as a zero-length payload.
    pub fn encode(&self, command: &Command) -> Result<Vec<u8>> {
        let limit = self.format.max_payload.min(u8::MAX as usize);
        if command.len() > limit {
            return Err(Error::Encoding(format!(
                "command is {} bytes, limit is {limit}",
                command.len()
            )));
        }
        Ok(self.format.request.encode(command.as_bytes()))
    }

    /// Frame a payload in the response direction, as a device would.
    pub fn encode_response(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() > u8::MAX as usize {
            return Err(Error::Encoding(format!(
                "response payload is {} bytes, limit is 255",
                payload.len()
            )));
        }
        Ok(self.format.response.encode(payload))
    }

    /// Size of a response header: sync preamble plus the length byte.
    pub fn header_len(&self) -> usize {
        self.format.response.sync.len() + 1
    }

    /// Validate a response header and return the declared payload length.
    ///
    /// Sync is checked over whatever bytes arrived before the length is, so
    /// a truncated header with a wrong preamble is `UnexpectedSync`.
    pub fn decode_header(&self, header: &[u8]) -> Result<usize> {
        let layout = &self.format.response;
        if !sync_prefix_matches(layout.sync, header) {
            return Err(Error::protocol(ProtocolErrorKind::UnexpectedSync, header));
        }
        if header.len() != self.header_len() {
            return Err(Error::protocol(
                ProtocolErrorKind::LengthMismatch {
                    expected: self.header_len(),
                    actual: header.len(),
                },
                header,
            ));
        }
        Ok(header[layout.sync.len()] as usize)
    }

    /// Number of bytes that follow a header declaring `declared_len`.
    pub fn body_len(&self, declared_len: usize) -> usize {
        let layout = &self.format.response;
        declared_len + layout.checksum.width() + layout.trailer.len()
    }

    /// Validate a response body (payload, checksum, trailer) and return the
    /// payload.
    pub fn decode_body(&self, body: &[u8], declared_len: usize) -> Result<Payload> {
        let layout = &self.format.response;
        let expected = self.body_len(declared_len);
        if body.len() != expected || declared_len > u8::MAX as usize {
            return Err(Error::protocol(
                ProtocolErrorKind::LengthMismatch {
                    expected,
                    actual: body.len(),
                },
                body,
            ));
        }

        let (payload, rest) = body.split_at(declared_len);
        let (checksum, trailer) = rest.split_at(layout.checksum.width());

        let computed = layout.checksum_of(declared_len as u8, payload);
        let carried = layout.checksum.read(checksum);
        if computed != carried {
            return Err(Error::protocol(
                ProtocolErrorKind::ChecksumFailed {
                    expected: computed,
                    actual: carried,
                },
                body,
            ));
        }
        if trailer != layout.trailer {
            return Err(Error::protocol(ProtocolErrorKind::MalformedTrailer, body));
        }

        Ok(Bytes::copy_from_slice(payload))
    }

    /// Size of an acknowledgement frame.
    pub fn ack_len(&self) -> usize {
        self.format.response.sync.len() + 3
    }

    /// Validate the acknowledgement of a command whose opcode was `opcode`.
    pub fn decode_ack(&self, opcode: u8, ack: &[u8]) -> Result<()> {
        let sync = self.format.response.sync;
        if !sync_prefix_matches(sync, ack) {
            return Err(Error::protocol(ProtocolErrorKind::UnexpectedSync, ack));
        }
        if ack.len() != self.ack_len() {
            return Err(Error::protocol(
                ProtocolErrorKind::LengthMismatch {
                    expected: self.ack_len(),
                    actual: ack.len(),
                },
                ack,
            ));
        }

        let [len, echo, checksum] = [ack[sync.len()], ack[sync.len() + 1], ack[sync.len() + 2]];
        if len != 1 {
            return Err(Error::protocol(
                ProtocolErrorKind::LengthMismatch {
                    expected: 1,
                    actual: len as usize,
                },
                ack,
            ));
        }
        if echo != checksum {
            return Err(Error::protocol(
                ProtocolErrorKind::AckChecksumFailed { echo, checksum },
                ack,
            ));
        }
        if echo != opcode {
            return Err(Error::protocol(
                ProtocolErrorKind::UnexpectedAck {
                    expected: opcode,
                    actual: echo,
                },
                ack,
            ));
        }
        Ok(())
    }

    /// Build the acknowledgement a device sends for `opcode`.
    pub fn encode_ack(&self, opcode: u8) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.ack_len());
        buf.put_slice(self.format.response.sync);
        buf.put_u8(1);
        buf.put_u8(opcode);
        buf.put_u8(opcode);
        buf.to_vec()
    }
}

fn sync_prefix_matches(sync: &[u8], received: &[u8]) -> bool {
    let n = sync.len().min(received.len());
    received[..n] == sync[..n]
}
