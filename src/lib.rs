#![doc(html_root_url = "https://docs.rs/wsframe/latest")]
//! Public API for the `wsframe` library.
//!
//! This crate implements the RFC 6455 frame header: parsing length fields,
//! decoding flags, opcode, and masking key from received bytes, building
//! headers for outgoing message fragments, and streaming payload bytes through
//! the rotating XOR mask. A `tokio_util` codec ties these together for
//! callers that read frames from a byte stream.

pub mod codec;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod header;
pub mod length;
pub mod mask;
pub mod metrics;
pub mod opcode;

pub use codec::{Frame, MaskingKeySource, WebSocketFrameCodec};
pub use config::{CodecConfig, Role};
pub use decode::{decode_header, decode_header_at};
pub use encode::{build_header, encode_flags};
pub use error::{
    CodecError,
    EofError,
    FramingError,
    ProtocolError,
    RecoveryPolicy,
    UsageError,
};
pub use header::{FrameFlags, FrameHeader, FrameLengths};
pub use length::{parse_frame_length, parse_lengths, parse_lengths_at};
pub use mask::{MaskingKey, PayloadCursor};
pub use metrics::{Direction, ERRORS_TOTAL, FRAMES_PROCESSED};
pub use opcode::Opcode;
