//! Header decoder.
//!
//! Combines the [`length`](crate::length) parser with flag, opcode, and
//! masking-key extraction. Input slices are only ever read.

use crate::{
    error::{CodecError, ProtocolError},
    header::{FrameFlags, FrameHeader, MASK_BIT, MAX_CONTROL_PAYLOAD},
    length::{parse_lengths, window},
    mask::{MASKING_KEY_LEN, MaskingKey},
};

/// Decode the header of the frame starting at `buf[0]`.
///
/// Returns `Ok(None)` while `buf` is too short to hold the whole header. The
/// opcode is checked as soon as the first byte is present, so an unknown
/// opcode is reported even from a partial header.
///
/// # Errors
///
/// - [`ProtocolError::UnknownOpcode`] for reserved opcode nibbles.
/// - [`ProtocolError::FragmentedControlFrame`] and
///   [`ProtocolError::OversizedControlFrame`] for malformed control frames.
/// - [`FramingError`](crate::error::FramingError) variants from the length parser.
///
/// # Examples
///
/// ```
/// use wsframe::{Opcode, decode_header};
///
/// let wire = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
/// let header = decode_header(&wire).unwrap().unwrap();
///
/// assert!(header.is_complete());
/// assert_eq!(header.opcode(), Opcode::Text);
/// assert_eq!(header.content_len(), 5);
/// assert_eq!(header.header_len(), 6);
/// ```
pub fn decode_header(buf: &[u8]) -> Result<Option<FrameHeader>, CodecError> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    let flags = FrameFlags::from_byte(first)?;
    if flags.opcode.is_control() && !flags.fin {
        return Err(ProtocolError::FragmentedControlFrame {
            opcode: flags.opcode,
        }
        .into());
    }

    let Some(lengths) = parse_lengths(buf)? else {
        return Ok(None);
    };
    if flags.opcode.is_control() && lengths.content_len > MAX_CONTROL_PAYLOAD {
        return Err(ProtocolError::OversizedControlFrame {
            opcode: flags.opcode,
            length: lengths.content_len,
        }
        .into());
    }

    Ok(Some(FrameHeader {
        flags,
        header_len: lengths.header_len,
        content_len: lengths.content_len,
        masking_key: read_masking_key(buf, lengths.header_len),
        raw: None,
    }))
}

/// Decode the header found in `buffer[offset .. offset + count]`.
///
/// # Errors
///
/// See [`decode_header`].
pub fn decode_header_at(
    buffer: &[u8],
    offset: usize,
    count: usize,
) -> Result<Option<FrameHeader>, CodecError> {
    match window(buffer, offset, count) {
        Some(buf) => decode_header(buf),
        None => Ok(None),
    }
}

/// The key occupies the four bytes immediately before the payload.
fn read_masking_key(buf: &[u8], header_len: usize) -> Option<MaskingKey> {
    if buf.get(1)? & MASK_BIT == 0 {
        return None;
    }
    let start = header_len.checked_sub(MASKING_KEY_LEN)?;
    let bytes: [u8; MASKING_KEY_LEN] = buf.get(start..header_len)?.try_into().ok()?;
    Some(MaskingKey::new(bytes))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{decode_header, decode_header_at};
    use crate::{
        error::{CodecError, FramingError, ProtocolError},
        mask::MaskingKey,
        opcode::Opcode,
    };

    const RFC_HELLO: [u8; 11] = [
        0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
    ];

    #[test]
    fn decodes_masked_text_frame() {
        let header = decode_header(&RFC_HELLO)
            .expect("valid header")
            .expect("complete header");
        assert!(header.is_complete());
        assert_eq!(header.opcode(), Opcode::Text);
        assert_eq!(header.content_len(), 5);
        assert_eq!(header.header_len(), 6);
        assert_eq!(
            header.masking_key(),
            Some(MaskingKey::new([0x37, 0xfa, 0x21, 0x3d]))
        );
        assert!(header.raw().is_none());

        let cursor = header.payload_cursor();
        assert_eq!(cursor.remaining(), 5);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn decodes_unmasked_frame_without_key() {
        let header = decode_header(&[0x01, 0x03, b'a', b'b', b'c'])
            .expect("valid header")
            .expect("complete header");
        assert!(!header.is_complete());
        assert_eq!(header.opcode(), Opcode::Text);
        assert_eq!(header.header_len(), 2);
        assert!(header.masking_key().is_none());
    }

    #[test]
    fn masking_key_follows_extended_length() {
        let buf = [0x82, 0xFE, 0x01, 0x00, 9, 8, 7, 6];
        let header = decode_header(&buf)
            .expect("valid header")
            .expect("complete header");
        assert_eq!(header.content_len(), 256);
        assert_eq!(header.header_len(), 8);
        assert_eq!(header.masking_key(), Some(MaskingKey::new([9, 8, 7, 6])));
    }

    #[test]
    fn reserved_bits_are_reported() {
        let header = decode_header(&[0xC1, 0x00])
            .expect("valid header")
            .expect("complete header");
        let flags = header.flags();
        assert!(flags.rsv1);
        assert!(!flags.rsv2);
        assert!(!flags.rsv3);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::partial_key(&RFC_HELLO[..5])]
    fn partial_headers_are_insufficient(#[case] buf: &[u8]) {
        assert!(matches!(decode_header(buf), Ok(None)));
    }

    #[rstest]
    #[case(0x83)]
    #[case(0x07)]
    #[case(0x8B)]
    #[case(0x8F)]
    fn unknown_opcode_is_a_protocol_error(#[case] first: u8) {
        let err = decode_header(&[first]).expect_err("reserved opcode");
        assert!(matches!(
            err,
            CodecError::Protocol(ProtocolError::UnknownOpcode { code }) if code == first & 0x0F
        ));
    }

    #[test]
    fn fragmented_control_frame_is_rejected() {
        let err = decode_header(&[0x09, 0x00]).expect_err("ping without FIN");
        assert!(matches!(
            err,
            CodecError::Protocol(ProtocolError::FragmentedControlFrame {
                opcode: Opcode::Ping
            })
        ));
    }

    #[test]
    fn oversized_control_frame_is_rejected() {
        let err = decode_header(&[0x88, 0x7E, 0x00, 0x80]).expect_err("close too long");
        assert!(matches!(
            err,
            CodecError::Protocol(ProtocolError::OversizedControlFrame {
                opcode: Opcode::Close,
                length: 128
            })
        ));
    }

    #[test]
    fn length_errors_propagate() {
        let err = decode_header(&[0x82, 0x7F, 0xFF, 0, 0, 0, 0, 0, 0, 0]).expect_err("overflow");
        assert!(matches!(
            err,
            CodecError::Framing(FramingError::LengthOverflow)
        ));
    }

    #[test]
    fn decodes_from_window() {
        let mut buffer = vec![0x00; 4];
        buffer.extend_from_slice(&RFC_HELLO);
        let header = decode_header_at(&buffer, 4, 6)
            .expect("valid header")
            .expect("complete header");
        assert_eq!(header.content_len(), 5);
        assert!(matches!(decode_header_at(&buffer, 4, 100), Ok(None)));
    }
}
