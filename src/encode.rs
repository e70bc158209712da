//! Header encoder.
//!
//! Builds the header for one outgoing chunk of a possibly fragmented message.
//! The opcode written to the wire follows from two bits of per-message state:
//!
//! | final | header already sent | FIN | opcode on wire |
//! |-------|---------------------|-----|----------------|
//! | yes   | no                  | 1   | given opcode   |
//! | yes   | yes                 | 1   | Continuation   |
//! | no    | no                  | 0   | given opcode   |
//! | no    | yes                 | 0   | Continuation   |
//!
//! Headers are built unmasked. Clients attach a key afterwards with
//! [`FrameHeader::with_masking_key`].

use bytes::{BufMut, BytesMut};

use crate::{
    error::UsageError,
    header::{
        FrameFlags,
        FrameHeader,
        LENGTH_MARKER_U16,
        LENGTH_MARKER_U64,
        MASK_BIT,
        MAX_CONTROL_PAYLOAD,
        MAX_PAYLOAD_LEN,
        MAX_SHORT_LENGTH,
        unmasked_header_len,
    },
    mask::MaskingKey,
    opcode::Opcode,
};

/// Build the header for a `payload_len`-byte chunk.
///
/// # Errors
///
/// - [`UsageError::PayloadTooLarge`] if `payload_len` exceeds the 63-bit limit.
/// - [`UsageError::ContinuationWithoutStart`] if `opcode` is
///   [`Opcode::Continuation`] on the first frame of a message.
/// - [`UsageError::InvalidControlFrame`] if a control opcode is used for a
///   non-final frame or a payload longer than 125 bytes.
///
/// # Examples
///
/// ```
/// use wsframe::{Opcode, build_header};
///
/// let header = build_header(130, true, false, Opcode::Binary).unwrap();
/// assert_eq!(header.raw().unwrap().as_ref(), &[0x82, 0x7E, 0x00, 0x82]);
/// assert_eq!(header.header_len(), 4);
/// assert_eq!(header.content_len(), 130);
/// ```
pub fn build_header(
    payload_len: u64,
    is_final: bool,
    already_sent: bool,
    opcode: Opcode,
) -> Result<FrameHeader, UsageError> {
    let wire_opcode = wire_opcode(already_sent, opcode)?;
    encode_flags(FrameFlags::new(is_final, wire_opcode), payload_len)
}

/// Build a header from explicit flags, bypassing the continuation table.
///
/// Used for frames whose reserved bits carry extension state.
///
/// # Errors
///
/// Returns [`UsageError::PayloadTooLarge`] or
/// [`UsageError::InvalidControlFrame`] as for [`build_header`].
pub fn encode_flags(flags: FrameFlags, payload_len: u64) -> Result<FrameHeader, UsageError> {
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(UsageError::PayloadTooLarge { size: payload_len });
    }
    if flags.opcode.is_control() && (!flags.fin || payload_len > MAX_CONTROL_PAYLOAD) {
        return Err(UsageError::InvalidControlFrame {
            opcode: flags.opcode,
            is_final: flags.fin,
            length: payload_len,
        });
    }

    let header_len = unmasked_header_len(payload_len);
    let mut raw = BytesMut::with_capacity(header_len);
    put_header(&mut raw, flags, payload_len, None);

    Ok(FrameHeader {
        flags,
        header_len,
        content_len: payload_len,
        masking_key: None,
        raw: Some(raw.freeze()),
    })
}

fn wire_opcode(already_sent: bool, opcode: Opcode) -> Result<Opcode, UsageError> {
    match (already_sent, opcode) {
        (true, _) => Ok(Opcode::Continuation),
        (false, Opcode::Continuation) => Err(UsageError::ContinuationWithoutStart),
        (false, opcode) => Ok(opcode),
    }
}

/// Write a complete header: flags byte, length in its minimal form, and the
/// masking key when one is given.
///
/// Callers validate `payload_len` first; see [`encode_flags`].
pub(crate) fn put_header(
    dst: &mut BytesMut,
    flags: FrameFlags,
    payload_len: u64,
    key: Option<MaskingKey>,
) {
    let mask_bit = if key.is_some() { MASK_BIT } else { 0 };
    dst.put_u8(flags.to_byte());
    if payload_len <= MAX_SHORT_LENGTH {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "payload_len is at most 125 here"
        )]
        let direct = payload_len as u8;
        dst.put_u8(mask_bit | direct);
    } else if let Ok(short) = u16::try_from(payload_len) {
        dst.put_u8(mask_bit | LENGTH_MARKER_U16);
        dst.put_u16(short);
    } else {
        dst.put_u8(mask_bit | LENGTH_MARKER_U64);
        dst.put_u64(payload_len);
    }
    if let Some(key) = key {
        dst.put_slice(key.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{build_header, encode_flags};
    use crate::{
        error::UsageError,
        header::{FrameFlags, MAX_PAYLOAD_LEN},
        mask::MaskingKey,
        opcode::Opcode,
    };

    fn raw(len: u64, is_final: bool, already_sent: bool, opcode: Opcode) -> Vec<u8> {
        build_header(len, is_final, already_sent, opcode)
            .expect("valid header")
            .raw()
            .expect("encoder sets raw bytes")
            .to_vec()
    }

    #[rstest]
    #[case::single(true, false, 0x82)]
    #[case::last(true, true, 0x80)]
    #[case::first(false, false, 0x02)]
    #[case::middle(false, true, 0x00)]
    fn continuation_table(#[case] is_final: bool, #[case] already_sent: bool, #[case] first: u8) {
        assert_eq!(raw(3, is_final, already_sent, Opcode::Binary)[0], first);
    }

    #[test]
    fn three_fragment_message() {
        let first = build_header(10, false, false, Opcode::Text).expect("first");
        let middle = build_header(10, false, true, Opcode::Text).expect("middle");
        let last = build_header(10, true, true, Opcode::Text).expect("last");

        assert_eq!(first.opcode(), Opcode::Text);
        assert_eq!(middle.opcode(), Opcode::Continuation);
        assert_eq!(last.opcode(), Opcode::Continuation);
        assert!(!first.is_complete());
        assert!(!middle.is_complete());
        assert!(last.is_complete());
    }

    #[rstest]
    #[case::empty(0, vec![0x82, 0x00])]
    #[case::short_max(125, vec![0x82, 0x7D])]
    #[case::u16_min(126, vec![0x82, 0x7E, 0x00, 0x7E])]
    #[case::u16_example(130, vec![0x82, 0x7E, 0x00, 0x82])]
    #[case::u16_max(65_535, vec![0x82, 0x7E, 0xFF, 0xFF])]
    #[case::u64_min(65_536, vec![0x82, 0x7F, 0, 0, 0, 0, 0, 1, 0, 0])]
    fn length_uses_minimal_form(#[case] len: u64, #[case] expected: Vec<u8>) {
        let header = build_header(len, true, false, Opcode::Binary).expect("valid header");
        assert_eq!(header.raw().expect("raw bytes").as_ref(), expected.as_slice());
        assert_eq!(header.header_len(), expected.len());
        assert_eq!(header.content_len(), len);
        assert_eq!(header.payload_cursor().remaining(), len);
    }

    #[test]
    fn masked_130_byte_binary_frame() {
        let header = build_header(130, true, false, Opcode::Binary)
            .expect("valid header")
            .with_masking_key(MaskingKey::new([1, 2, 3, 4]));
        assert_eq!(
            header.raw().expect("raw bytes").as_ref(),
            &[0x82, 0xFE, 0x00, 0x82, 1, 2, 3, 4]
        );
        assert_eq!(header.header_len(), 8);
        assert!(header.is_masked());
    }

    #[test]
    fn replacing_a_masking_key_keeps_header_length() {
        let header = build_header(70_000, true, false, Opcode::Binary)
            .expect("valid header")
            .with_masking_key(MaskingKey::new([1, 1, 1, 1]))
            .with_masking_key(MaskingKey::new([2, 2, 2, 2]));
        let raw = header.raw().expect("raw bytes");
        assert_eq!(header.header_len(), 14);
        assert_eq!(raw.len(), 14);
        assert_eq!(&raw[10..], &[2, 2, 2, 2]);
    }

    #[test]
    fn oversized_payload_is_a_usage_error() {
        let size = MAX_PAYLOAD_LEN + 1;
        assert_eq!(
            build_header(size, true, false, Opcode::Binary),
            Err(UsageError::PayloadTooLarge { size })
        );
        assert!(build_header(MAX_PAYLOAD_LEN, true, false, Opcode::Binary).is_ok());
    }

    #[test]
    fn continuation_cannot_start_a_message() {
        assert_eq!(
            build_header(1, true, false, Opcode::Continuation),
            Err(UsageError::ContinuationWithoutStart)
        );
    }

    #[rstest]
    #[case::fragmented(false, 0)]
    #[case::oversized(true, 126)]
    fn invalid_control_frames_are_rejected(#[case] is_final: bool, #[case] len: u64) {
        let result = build_header(len, is_final, false, Opcode::Ping);
        assert!(matches!(
            result,
            Err(UsageError::InvalidControlFrame {
                opcode: Opcode::Ping,
                ..
            })
        ));
    }

    #[test]
    fn explicit_flags_keep_reserved_bits() {
        let flags = FrameFlags {
            rsv1: true,
            ..FrameFlags::new(true, Opcode::Text)
        };
        let header = encode_flags(flags, 4).expect("valid header");
        assert_eq!(header.raw().expect("raw bytes").as_ref(), &[0xC1, 0x04]);
    }
}
