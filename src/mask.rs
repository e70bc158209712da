//! Payload masking.
//!
//! Masking XORs each payload byte with one byte of a 4-byte key, rotating
//! through the key by payload position. The operation is its own inverse, so
//! the same code masks outgoing payloads and unmasks incoming ones.
//!
//! [`PayloadCursor`] carries the per-frame consumption state that a header
//! value must not: how far into the payload the consumer has got and how many
//! bytes remain. It is owned by whoever reads the frame's payload.

use std::fmt;

use crate::error::UsageError;

/// Width of a masking key in bytes.
pub const MASKING_KEY_LEN: usize = 4;

/// Four-byte XOR key attached to masked frames.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskingKey([u8; MASKING_KEY_LEN]);

impl MaskingKey {
    /// Wrap raw key bytes.
    #[must_use]
    pub const fn new(bytes: [u8; MASKING_KEY_LEN]) -> Self { Self(bytes) }

    /// Return the key bytes in wire order.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MASKING_KEY_LEN] { &self.0 }

    /// Key byte applied to the payload byte at `position`.
    #[must_use]
    pub const fn byte_at(&self, position: u64) -> u8 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "position modulo the key length always fits in usize"
        )]
        let index = (position % MASKING_KEY_LEN as u64) as usize;
        self.0[index]
    }

    /// XOR `buf` in place, treating its first byte as payload position
    /// `offset`.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsframe::MaskingKey;
    ///
    /// let key = MaskingKey::new([0x37, 0xfa, 0x21, 0x3d]);
    /// let mut payload = *b"Hello";
    /// key.apply(0, &mut payload);
    /// assert_eq!(payload, [0x7f, 0x9f, 0x4d, 0x51, 0x58]);
    /// key.apply(0, &mut payload);
    /// assert_eq!(&payload, b"Hello");
    /// ```
    pub fn apply(&self, offset: u64, buf: &mut [u8]) {
        let mut position = offset;
        for byte in buf {
            *byte ^= self.byte_at(position);
            position = position.wrapping_add(1);
        }
    }
}

impl From<[u8; MASKING_KEY_LEN]> for MaskingKey {
    fn from(bytes: [u8; MASKING_KEY_LEN]) -> Self { Self(bytes) }
}

impl From<u32> for MaskingKey {
    fn from(value: u32) -> Self { Self(value.to_be_bytes()) }
}

impl fmt::Debug for MaskingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "MaskingKey({a:02x}{b:02x}{c:02x}{d:02x})")
    }
}

/// Sequential consumption state for one frame's payload.
///
/// Created from a header with
/// [`FrameHeader::payload_cursor`](crate::header::FrameHeader::payload_cursor).
/// Frames without a masking key pass bytes through untouched while still
/// tracking consumption.
///
/// # Examples
///
/// ```
/// use wsframe::decode_header;
///
/// let wire = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
/// let header = decode_header(&wire).unwrap().unwrap();
/// let mut cursor = header.payload_cursor();
///
/// let text: Vec<u8> = wire[header.header_len()..]
///     .iter()
///     .map(|&b| cursor.unmask_byte(b).unwrap())
///     .collect();
/// assert_eq!(text, b"Hello");
/// assert!(cursor.is_finished());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayloadCursor {
    key: Option<MaskingKey>,
    remaining: u64,
    position: u64,
}

impl PayloadCursor {
    /// Start a cursor at payload position zero.
    #[must_use]
    pub const fn new(key: Option<MaskingKey>, content_len: u64) -> Self {
        Self {
            key,
            remaining: content_len,
            position: 0,
        }
    }

    /// Bytes of payload still expected.
    #[must_use]
    pub const fn remaining(&self) -> u64 { self.remaining }

    /// Bytes of payload processed so far.
    #[must_use]
    pub const fn position(&self) -> u64 { self.position }

    /// Report whether the last payload byte has been processed.
    #[must_use]
    pub const fn is_finished(&self) -> bool { self.remaining == 0 }

    /// Unmask the next payload byte.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::PayloadExhausted`] if the frame's payload has
    /// already been fully consumed. The cursor is left unchanged.
    pub fn unmask_byte(&mut self, byte: u8) -> Result<u8, UsageError> {
        if self.remaining == 0 {
            return Err(UsageError::PayloadExhausted { requested: 1 });
        }
        let out = match self.key {
            Some(key) => byte ^ key.byte_at(self.position),
            None => byte,
        };
        self.position += 1;
        self.remaining -= 1;
        Ok(out)
    }

    /// Unmask a run of consecutive payload bytes in place.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::PayloadExhausted`] if `buf` is longer than the
    /// remaining payload. Nothing is modified in that case.
    pub fn unmask_in_place(&mut self, buf: &mut [u8]) -> Result<(), UsageError> {
        let len = u64::try_from(buf.len()).map_err(|_| UsageError::PayloadExhausted {
            requested: u64::MAX,
        })?;
        if len > self.remaining {
            return Err(UsageError::PayloadExhausted {
                requested: len - self.remaining,
            });
        }
        if let Some(key) = self.key {
            key.apply(self.position, buf);
        }
        self.position += len;
        self.remaining -= len;
        Ok(())
    }
}
