//! Length parser.
//!
//! Reads just enough of a frame's start to learn how long its header is and
//! how many payload bytes follow. Flags and opcode are left to
//! [`decode`](crate::decode).

use bytes::Buf;

use crate::{
    error::FramingError,
    header::{
        BASE_HEADER_LEN,
        FrameLengths,
        LENGTH_MARKER_MASK,
        LENGTH_MARKER_U16,
        LENGTH_MARKER_U64,
        MASK_BIT,
        MAX_PAYLOAD_LEN,
        MAX_SHORT_LENGTH,
    },
    mask::MASKING_KEY_LEN,
};

/// Bytes of header needed to interpret the frame starting at `buf[0]`.
///
/// Before the second byte has arrived the answer is the two-byte base header;
/// afterwards it accounts for the extended length form and the masking key.
///
/// # Examples
///
/// ```
/// use wsframe::length::required_header_len;
///
/// assert_eq!(required_header_len(&[0x81]), 2);
/// assert_eq!(required_header_len(&[0x81, 0x05]), 2);
/// assert_eq!(required_header_len(&[0x81, 0x85]), 6);
/// assert_eq!(required_header_len(&[0x82, 0xFE]), 8);
/// assert_eq!(required_header_len(&[0x82, 0x7F]), 10);
/// ```
#[must_use]
pub fn required_header_len(buf: &[u8]) -> usize {
    let Some(&len_byte) = buf.get(1) else {
        return BASE_HEADER_LEN;
    };
    let extended = match len_byte & LENGTH_MARKER_MASK {
        LENGTH_MARKER_U16 => 2,
        LENGTH_MARKER_U64 => 8,
        _ => 0,
    };
    let key = if len_byte & MASK_BIT != 0 {
        MASKING_KEY_LEN
    } else {
        0
    };
    BASE_HEADER_LEN + extended + key
}

/// Parse the header and payload lengths of the frame starting at `buf[0]`.
///
/// Returns `Ok(None)` until `buf` holds the complete header: 6, 8, or 14
/// bytes for masked frames, 2, 4, or 10 bytes for unmasked ones. The call can
/// be repeated unchanged once more bytes have arrived.
///
/// All three length forms are accepted, but each only in its minimal use:
/// the 16-bit form must carry 126 or more, and the 64-bit form more than
/// 65 535. RFC 6455 section 5.2 requires the minimal encoding, so a longer
/// form carrying a small value is treated as a malformed header rather than
/// read leniently.
///
/// # Errors
///
/// Returns [`FramingError::LengthOverflow`] if the 64-bit length has its top
/// bit set, and [`FramingError::NonMinimalLength`] if an extended form holds a
/// value that a shorter form could carry.
///
/// # Examples
///
/// ```
/// use wsframe::{FrameLengths, length::parse_lengths};
///
/// let lengths = parse_lengths(&[0x82, 0xFE, 0x00, 0x82, 1, 2, 3, 4])
///     .unwrap()
///     .unwrap();
/// assert_eq!(
///     lengths,
///     FrameLengths {
///         header_len: 8,
///         content_len: 130
///     }
/// );
/// assert_eq!(parse_lengths(&[0x82, 0xFE, 0x00]).unwrap(), None);
/// ```
pub fn parse_lengths(buf: &[u8]) -> Result<Option<FrameLengths>, FramingError> {
    let header_len = required_header_len(buf);
    if buf.len() < header_len {
        return Ok(None);
    }

    let marker = buf[1] & LENGTH_MARKER_MASK;
    let mut extended = &buf[BASE_HEADER_LEN..];
    let content_len = match marker {
        LENGTH_MARKER_U16 => {
            let length = u64::from(extended.get_u16());
            if length <= MAX_SHORT_LENGTH {
                return Err(FramingError::NonMinimalLength { marker, length });
            }
            length
        }
        LENGTH_MARKER_U64 => {
            let length = extended.get_u64();
            if length > MAX_PAYLOAD_LEN {
                return Err(FramingError::LengthOverflow);
            }
            if length <= u64::from(u16::MAX) {
                return Err(FramingError::NonMinimalLength { marker, length });
            }
            length
        }
        direct => u64::from(direct),
    };

    Ok(Some(FrameLengths {
        header_len,
        content_len,
    }))
}

/// Parse lengths from `buffer[offset .. offset + count]`.
///
/// A window that does not lie within `buffer` is treated as not yet holding
/// enough data.
///
/// # Errors
///
/// See [`parse_lengths`].
pub fn parse_lengths_at(
    buffer: &[u8],
    offset: usize,
    count: usize,
) -> Result<Option<FrameLengths>, FramingError> {
    match window(buffer, offset, count) {
        Some(buf) => parse_lengths(buf),
        None => Ok(None),
    }
}

/// Total bytes, header plus payload, of the frame starting at `buf[0]`.
///
/// Transports use this to decide how much to buffer before decoding.
///
/// # Errors
///
/// Propagates [`parse_lengths`] errors, and returns
/// [`FramingError::LengthOverflow`] if the total does not fit in `u64`.
pub fn parse_frame_length(buf: &[u8]) -> Result<Option<u64>, FramingError> {
    parse_lengths(buf)?
        .map(|lengths| lengths.frame_len().ok_or(FramingError::LengthOverflow))
        .transpose()
}

pub(crate) fn window(buffer: &[u8], offset: usize, count: usize) -> Option<&[u8]> {
    let end = offset.checked_add(count)?;
    buffer.get(offset..end)
}
