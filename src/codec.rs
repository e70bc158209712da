//! Tokio codec for whole WebSocket frames.
//!
//! [`WebSocketFrameCodec`] connects the header codec to a byte stream: it
//! waits until a complete frame is buffered, enforces the role's masking rule
//! and the configured size ceiling, and hands out frames whose payload has
//! already been unmasked. Encoding applies the same rules in reverse.
//!
//! The codec does not reassemble fragmented messages; every wire frame is
//! yielded on its own.
//!
//! # Error Handling
//!
//! Failures are reported as [`CodecError`] converted into [`io::Error`], as
//! required by the `tokio_util` traits. Use
//! [`CodecError::default_recovery_policy`] on the original error to decide
//! whether the connection survives.

use std::{fmt, io};

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    config::CodecConfig,
    decode::decode_header,
    encode::{build_header, encode_flags, put_header},
    error::{CodecError, EofError, FramingError, ProtocolError, UsageError},
    header::{FrameFlags, FrameHeader},
    length::{parse_lengths, required_header_len},
    mask::{MASKING_KEY_LEN, MaskingKey},
    metrics::{self, Direction},
    opcode::Opcode,
};

/// A single wire frame with its payload in plaintext.
///
/// A frame carries two distinct keys. [`Frame::masking_key`] is the key to
/// mask with when the frame is encoded; [`Frame::received_masking_key`] is the
/// key a decoded frame arrived under. Decoding fills only the latter, so a
/// received frame can be sent straight back through the same codec.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    flags: FrameFlags,
    masking_key: Option<MaskingKey>,
    received_key: Option<MaskingKey>,
    payload: Bytes,
}

impl Frame {
    /// Create a frame from explicit flags.
    #[must_use]
    pub fn new(flags: FrameFlags, payload: impl Into<Bytes>) -> Self {
        Self {
            flags,
            masking_key: None,
            received_key: None,
            payload: payload.into(),
        }
    }

    /// Create one chunk of a possibly fragmented message.
    ///
    /// The opcode on the wire follows the continuation rules of
    /// [`build_header`].
    ///
    /// # Errors
    ///
    /// Returns the [`UsageError`] produced by [`build_header`].
    ///
    /// # Examples
    ///
    /// ```
    /// use wsframe::{Frame, Opcode};
    ///
    /// let middle = Frame::chunk(Opcode::Text, "lo, wor", false, true).unwrap();
    /// assert_eq!(middle.opcode(), Opcode::Continuation);
    /// assert!(!middle.is_final());
    /// ```
    pub fn chunk(
        opcode: Opcode,
        payload: impl Into<Bytes>,
        is_final: bool,
        already_sent: bool,
    ) -> Result<Self, UsageError> {
        let payload = payload.into();
        let header = build_header(payload_len(&payload)?, is_final, already_sent, opcode)?;
        Ok(Self::new(header.flags(), payload))
    }

    /// Single-frame text message.
    #[must_use]
    pub fn text(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameFlags::new(true, Opcode::Text), payload)
    }

    /// Single-frame binary message.
    #[must_use]
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameFlags::new(true, Opcode::Binary), payload)
    }

    /// Ping control frame.
    #[must_use]
    pub fn ping(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameFlags::new(true, Opcode::Ping), payload)
    }

    /// Pong control frame.
    #[must_use]
    pub fn pong(payload: impl Into<Bytes>) -> Self {
        Self::new(FrameFlags::new(true, Opcode::Pong), payload)
    }

    /// Mask this frame with `key` when it is encoded.
    #[must_use]
    pub fn with_masking_key(mut self, key: MaskingKey) -> Self {
        self.masking_key = Some(key);
        self
    }

    /// Return the frame flags.
    #[must_use]
    pub const fn flags(&self) -> FrameFlags { self.flags }

    /// Return the wire opcode.
    #[must_use]
    pub const fn opcode(&self) -> Opcode { self.flags.opcode }

    /// Report whether the FIN bit is set.
    #[must_use]
    pub const fn is_final(&self) -> bool { self.flags.fin }

    /// Key to mask the payload with when encoding.
    #[must_use]
    pub const fn masking_key(&self) -> Option<MaskingKey> { self.masking_key }

    /// Key the payload was masked with on the wire, for decoded frames.
    #[must_use]
    pub const fn received_masking_key(&self) -> Option<MaskingKey> { self.received_key }

    /// Plaintext payload.
    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    /// Consume the frame, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Bytes { self.payload }
}

fn payload_len(payload: &[u8]) -> Result<u64, UsageError> {
    u64::try_from(payload.len()).map_err(|_| UsageError::PayloadTooLarge { size: u64::MAX })
}

/// Supplies fresh masking keys for client frames that do not carry one.
///
/// Without a source a client codec draws keys from [`rand::random`].
pub type MaskingKeySource = Box<dyn FnMut() -> MaskingKey + Send>;

/// Frame codec for one end of a WebSocket connection.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use tokio_util::codec::{Decoder, Encoder};
/// use wsframe::{CodecConfig, Frame, MaskingKey, Role, WebSocketFrameCodec};
///
/// let mut client = WebSocketFrameCodec::new(CodecConfig::new(Role::Client));
/// let mut server = WebSocketFrameCodec::new(CodecConfig::new(Role::Server));
///
/// let mut wire = BytesMut::new();
/// client
///     .encode(
///         Frame::text("Hello").with_masking_key(MaskingKey::new([0x37, 0xfa, 0x21, 0x3d])),
///         &mut wire,
///     )
///     .unwrap();
/// assert_eq!(&wire[..2], &[0x81, 0x85]);
///
/// let frame = server.decode(&mut wire).unwrap().unwrap();
/// assert_eq!(frame.payload().as_ref(), b"Hello");
/// ```
pub struct WebSocketFrameCodec {
    config: CodecConfig,
    key_source: Option<MaskingKeySource>,
}

impl WebSocketFrameCodec {
    /// Construct a codec with `config`.
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            key_source: None,
        }
    }

    /// Draw masking keys from `source` for outgoing client frames that do
    /// not carry their own key.
    #[must_use]
    pub fn with_key_source<F>(mut self, source: F) -> Self
    where
        F: FnMut() -> MaskingKey + Send + 'static,
    {
        self.key_source = Some(Box::new(source));
        self
    }

    /// Return the codec configuration.
    #[must_use]
    pub const fn config(&self) -> &CodecConfig { &self.config }

    fn check_masking(&self, header: &FrameHeader) -> Result<(), ProtocolError> {
        match (self.config.role().expects_masked_input(), header.is_masked()) {
            (true, false) => Err(ProtocolError::UnmaskedFrame),
            (false, true) => Err(ProtocolError::UnexpectedMask),
            _ => Ok(()),
        }
    }

    fn check_size(&self, size: u64) -> Result<usize, FramingError> {
        let max = self.config.max_frame_length();
        usize::try_from(size)
            .ok()
            .filter(|&len| len <= max)
            .ok_or(FramingError::OversizedFrame { size, max })
    }

    fn decode_frame(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, CodecError> {
        let Some(header) = decode_header(src)? else {
            let need = required_header_len(src);
            tracing::trace!(have = src.len(), need, "waiting for frame header");
            src.reserve(need.saturating_sub(src.len()));
            return Ok(None);
        };
        self.check_masking(&header)?;
        let content_len = self.check_size(header.content_len())?;

        let total = header.header_len() + content_len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let mut frame_bytes = src.split_to(total);
        frame_bytes.advance(header.header_len());
        header.payload_cursor().unmask_in_place(&mut frame_bytes)?;

        tracing::debug!(
            opcode = %header.opcode(),
            fin = header.is_complete(),
            len = content_len,
            masked = header.is_masked(),
            "decoded frame"
        );
        metrics::inc_frames(Direction::Inbound);
        Ok(Some(Frame {
            flags: header.flags(),
            masking_key: None,
            received_key: header.masking_key(),
            payload: frame_bytes.freeze(),
        }))
    }

    fn outgoing_key(&mut self, frame: &Frame) -> Result<Option<MaskingKey>, UsageError> {
        if !self.config.role().masks_output() {
            return match frame.masking_key {
                Some(_) => Err(UsageError::UnexpectedMaskingKey),
                None => Ok(None),
            };
        }
        let key = frame.masking_key.unwrap_or_else(|| match self.key_source.as_mut() {
            Some(source) => source(),
            None => MaskingKey::new(rand::random()),
        });
        Ok(Some(key))
    }

    fn encode_frame(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), CodecError> {
        let len = frame.payload.len();
        let max = self.config.max_frame_length();
        let size = payload_len(&frame.payload)?;
        if len > max {
            return Err(FramingError::OversizedFrame { size, max }.into());
        }

        let header = encode_flags(frame.flags, size)?;
        let key = self.outgoing_key(&frame)?;
        let key_len = if key.is_some() { MASKING_KEY_LEN } else { 0 };

        dst.reserve(header.header_len() + key_len + len);
        put_header(dst, header.flags(), size, key);
        let payload_start = dst.len();
        dst.extend_from_slice(&frame.payload);
        if let Some(key) = key {
            key.apply(0, &mut dst[payload_start..]);
        }

        tracing::debug!(
            opcode = %header.opcode(),
            fin = header.is_complete(),
            len,
            masked = key.is_some(),
            "encoded frame"
        );
        metrics::inc_frames(Direction::Outbound);
        Ok(())
    }
}

impl fmt::Debug for WebSocketFrameCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketFrameCodec")
            .field("config", &self.config)
            .field("key_source", &self.key_source.is_some())
            .finish()
    }
}

impl Default for WebSocketFrameCodec {
    fn default() -> Self { Self::new(CodecConfig::default()) }
}

fn report(err: CodecError) -> io::Error {
    metrics::inc_errors(err.error_type());
    if err.should_disconnect() {
        tracing::warn!(error = %err, kind = err.error_type(), "frame codec failure");
    } else {
        tracing::debug!(error = %err, kind = err.error_type(), "frame rejected");
    }
    err.into()
}

impl Decoder for WebSocketFrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decode_frame(src).map_err(report)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => Err(report(build_eof_error(src).into())),
        }
    }
}

/// Describe where the stream ended for a buffer holding a partial frame.
fn build_eof_error(src: &BytesMut) -> EofError {
    let bytes_received = src.len();
    match parse_lengths(src) {
        Ok(Some(lengths)) => EofError::MidFrame {
            bytes_received: bytes_received.saturating_sub(lengths.header_len),
            expected: lengths.content_len,
        },
        _ => EofError::MidHeader {
            bytes_received,
            header_size: required_header_len(src),
        },
    }
}

impl Encoder<Frame> for WebSocketFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode_frame(item, dst).map_err(report)
    }
}
