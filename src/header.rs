//! Frame header model.
//!
//! ```text
//! byte 0:  FIN(1) RSV1(1) RSV2(1) RSV3(1) OPCODE(4)
//! byte 1:  MASK(1) LENGTH-MARKER(7)
//!   marker == 126: next 2 bytes are a big-endian u16 length
//!   marker == 127: next 8 bytes are a big-endian u64 length
//!   MASK == 1:     next 4 bytes are the masking key
//! ```

use bytes::{Bytes, BytesMut};

use crate::{
    encode::put_header,
    error::ProtocolError,
    mask::{MASKING_KEY_LEN, MaskingKey, PayloadCursor},
    opcode::Opcode,
};

pub(crate) const FIN_BIT: u8 = 0x80;
pub(crate) const RSV1_BIT: u8 = 0x40;
pub(crate) const RSV2_BIT: u8 = 0x20;
pub(crate) const RSV3_BIT: u8 = 0x10;
pub(crate) const OPCODE_MASK: u8 = 0x0F;
pub(crate) const MASK_BIT: u8 = 0x80;
pub(crate) const LENGTH_MARKER_MASK: u8 = 0x7F;

/// Largest length carried directly in the 7-bit marker.
pub const MAX_SHORT_LENGTH: u64 = 125;
/// Marker announcing a 16-bit extended length.
pub const LENGTH_MARKER_U16: u8 = 126;
/// Marker announcing a 64-bit extended length.
pub const LENGTH_MARKER_U64: u8 = 127;
/// Largest payload a control frame may carry.
pub const MAX_CONTROL_PAYLOAD: u64 = MAX_SHORT_LENGTH;
/// Largest length the 64-bit form may carry; the top bit must be clear.
pub const MAX_PAYLOAD_LEN: u64 = i64::MAX as u64;

/// Size of the fixed part of every header.
pub const BASE_HEADER_LEN: usize = 2;

/// Header length for a payload of `content_len` bytes, before any masking key.
#[must_use]
pub const fn unmasked_header_len(content_len: u64) -> usize {
    if content_len <= MAX_SHORT_LENGTH {
        BASE_HEADER_LEN
    } else if content_len <= u16::MAX as u64 {
        BASE_HEADER_LEN + 2
    } else {
        BASE_HEADER_LEN + 8
    }
}

/// FIN, reserved bits, and opcode from the first header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each flag mirrors one bit of the wire format"
)]
pub struct FrameFlags {
    /// Final fragment of a message.
    pub fin: bool,
    /// Extension bit 1 (per-message compression when negotiated).
    pub rsv1: bool,
    /// Extension bit 2.
    pub rsv2: bool,
    /// Extension bit 3.
    pub rsv3: bool,
    /// Frame opcode.
    pub opcode: Opcode,
}

impl FrameFlags {
    /// Flags for an unextended frame.
    #[must_use]
    pub const fn new(fin: bool, opcode: Opcode) -> Self {
        Self {
            fin,
            rsv1: false,
            rsv2: false,
            rsv3: false,
            opcode,
        }
    }

    /// Parse the first header byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownOpcode`] if the low nibble is not a
    /// defined opcode.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsframe::{FrameFlags, Opcode};
    ///
    /// let flags = FrameFlags::from_byte(0x82).unwrap();
    /// assert!(flags.fin);
    /// assert_eq!(flags.opcode, Opcode::Binary);
    /// assert!(FrameFlags::from_byte(0x8B).is_err());
    /// ```
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        Ok(Self {
            fin: byte & FIN_BIT != 0,
            rsv1: byte & RSV1_BIT != 0,
            rsv2: byte & RSV2_BIT != 0,
            rsv3: byte & RSV3_BIT != 0,
            opcode: Opcode::try_from(byte & OPCODE_MASK)?,
        })
    }

    /// Pack the flags into the first header byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        let mut byte = self.opcode.code();
        if self.fin {
            byte |= FIN_BIT;
        }
        if self.rsv1 {
            byte |= RSV1_BIT;
        }
        if self.rsv2 {
            byte |= RSV2_BIT;
        }
        if self.rsv3 {
            byte |= RSV3_BIT;
        }
        byte
    }
}

/// Output of the length parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLengths {
    /// Header bytes, including the masking key when present.
    pub header_len: usize,
    /// Declared payload bytes.
    pub content_len: u64,
}

impl FrameLengths {
    /// Total frame size, header plus payload.
    ///
    /// Returns `None` if the sum does not fit in `u64`.
    #[must_use]
    pub fn frame_len(&self) -> Option<u64> {
        u64::try_from(self.header_len)
            .ok()
            .and_then(|header| header.checked_add(self.content_len))
    }
}

/// Header of a single wire frame.
///
/// Headers are produced by [`decode_header`](crate::decode::decode_header)
/// from received bytes or by [`build_header`](crate::encode::build_header)
/// for sending. Either way the value is immutable; payload consumption is
/// tracked by a separate [`PayloadCursor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    pub(crate) flags: FrameFlags,
    pub(crate) header_len: usize,
    pub(crate) content_len: u64,
    pub(crate) masking_key: Option<MaskingKey>,
    pub(crate) raw: Option<Bytes>,
}

impl FrameHeader {
    /// Return the header flags.
    #[must_use]
    pub const fn flags(&self) -> FrameFlags { self.flags }

    /// Return the opcode as it appears on the wire.
    #[must_use]
    pub const fn opcode(&self) -> Opcode { self.flags.opcode }

    /// Report whether this frame completes its message.
    #[must_use]
    pub const fn is_complete(&self) -> bool { self.flags.fin }

    /// Header size in bytes, including any masking key.
    #[must_use]
    pub const fn header_len(&self) -> usize { self.header_len }

    /// Declared payload size in bytes.
    #[must_use]
    pub const fn content_len(&self) -> u64 { self.content_len }

    /// Header and payload size together.
    #[must_use]
    pub fn lengths(&self) -> FrameLengths {
        FrameLengths {
            header_len: self.header_len,
            content_len: self.content_len,
        }
    }

    /// Masking key, present on masked frames only.
    #[must_use]
    pub const fn masking_key(&self) -> Option<MaskingKey> { self.masking_key }

    /// Report whether the frame carries a masking key.
    #[must_use]
    pub const fn is_masked(&self) -> bool { self.masking_key.is_some() }

    /// Encoded header bytes, present on headers built for sending.
    #[must_use]
    pub fn raw(&self) -> Option<&Bytes> { self.raw.as_ref() }

    /// Begin consuming this frame's payload.
    #[must_use]
    pub const fn payload_cursor(&self) -> PayloadCursor {
        PayloadCursor::new(self.masking_key, self.content_len)
    }

    /// Attach a masking key, preparing the header for sending.
    ///
    /// Sets the MASK bit, rewrites the raw bytes with the key after the
    /// length, and grows the header length by four. Any key already attached
    /// is replaced. Decoded headers, which carry no raw bytes, gain them here.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsframe::{MaskingKey, Opcode, build_header};
    ///
    /// let header = build_header(5, true, false, Opcode::Text)
    ///     .unwrap()
    ///     .with_masking_key(MaskingKey::new([1, 2, 3, 4]));
    /// assert_eq!(header.header_len(), 6);
    /// assert_eq!(header.raw().unwrap().as_ref(), &[0x81, 0x85, 1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn with_masking_key(self, key: MaskingKey) -> Self {
        let header_len = unmasked_header_len(self.content_len) + MASKING_KEY_LEN;
        let mut raw = BytesMut::with_capacity(header_len);
        put_header(&mut raw, self.flags, self.content_len, Some(key));
        Self {
            header_len,
            masking_key: Some(key),
            raw: Some(raw.freeze()),
            ..self
        }
    }
}
