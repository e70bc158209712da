//! Error types for the frame-header codec.
//!
//! The taxonomy separates wire-structure problems from semantic protocol
//! violations and from mistakes made by the calling code. "Not enough bytes
//! yet" is never an error: parsing functions return `Ok(None)` for it, in the
//! same way as [`tokio_util::codec::Decoder::decode`].
//!
//! # Error Categories
//!
//! - [`FramingError`]: Wire-level issues in the length fields (oversized frames, non-minimal or
//!   overflowing extended lengths, incomplete headers).
//! - [`ProtocolError`]: Semantic violations of RFC 6455 in an otherwise well-formed header (unknown
//!   opcodes, fragmented or oversized control frames, wrong masking for the role).
//! - [`UsageError`]: Caller contract violations such as consuming past the end of a payload or
//!   asking for a header that cannot be represented.
//! - [`EofError`]: The stream ended part-way through a frame.
//! - [`CodecError`]: Top-level enum wrapping all categories plus I/O errors.

use std::io;

use thiserror::Error;

use crate::opcode::Opcode;

/// Framing-level errors found while reading the length fields.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// Declared payload exceeds the configured maximum.
    #[error("frame exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Payload size declared by the header.
        size: u64,
        /// Maximum allowed payload size.
        max: usize,
    },

    /// An extended length field carries a value a shorter form could hold.
    #[error("non-minimal length encoding: {length} sent with marker {marker}")]
    NonMinimalLength {
        /// Seven-bit marker (126 or 127).
        marker: u8,
        /// Decoded length.
        length: u64,
    },

    /// The 64-bit length has its most significant bit set, or the frame
    /// length does not fit in `u64`.
    #[error("frame length overflows the 63-bit limit")]
    LengthOverflow,

    /// Incomplete frame header at end of input.
    #[error("incomplete frame header: have {have}, need {need}")]
    IncompleteHeader {
        /// Bytes currently available.
        have: usize,
        /// Bytes required for a complete header.
        need: usize,
    },
}

/// Protocol violations in a structurally valid header.
///
/// All of these are fatal to the connection.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Opcode nibble outside the set defined by RFC 6455.
    #[error("unknown opcode: {code:#x}")]
    UnknownOpcode {
        /// Offending code point.
        code: u8,
    },

    /// Control frame with the FIN bit clear.
    #[error("fragmented {opcode} control frame")]
    FragmentedControlFrame {
        /// Control opcode carried by the frame.
        opcode: Opcode,
    },

    /// Control frame longer than 125 bytes.
    #[error("{opcode} control frame declares {length} bytes")]
    OversizedControlFrame {
        /// Control opcode carried by the frame.
        opcode: Opcode,
        /// Declared payload length.
        length: u64,
    },

    /// A server received a frame without a masking key.
    #[error("client frame is not masked")]
    UnmaskedFrame,

    /// A client received a frame carrying a masking key.
    #[error("server frame is masked")]
    UnexpectedMask,
}

/// Programming errors in the code driving the codec.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UsageError {
    /// More payload bytes were fed through a cursor than the header declared.
    #[error("payload already consumed: {requested} byte(s) past the end")]
    PayloadExhausted {
        /// Bytes the caller tried to process beyond the declared length.
        requested: u64,
    },

    /// Payload length cannot be represented in a 63-bit length field.
    #[error("payload of {size} bytes cannot be framed")]
    PayloadTooLarge {
        /// Requested payload size.
        size: u64,
    },

    /// Continuation requested for the first frame of a message.
    #[error("continuation frame requested before any message header was sent")]
    ContinuationWithoutStart,

    /// A server tried to send a masked frame.
    #[error("server frames must not be masked")]
    UnexpectedMaskingKey,

    /// Control frame that is fragmented or longer than 125 bytes.
    #[error("invalid {opcode} control frame: final={is_final}, length={length}")]
    InvalidControlFrame {
        /// Control opcode requested.
        opcode: Opcode,
        /// Whether the frame was marked final.
        is_final: bool,
        /// Requested payload length.
        length: u64,
    },
}

/// End-of-stream conditions that leave a frame unfinished.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The stream ended inside the header.
    #[error("premature EOF during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
        /// Header size required.
        header_size: usize,
    },

    /// The stream ended inside the payload.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte payload received")]
    MidFrame {
        /// Payload bytes received before EOF.
        bytes_received: usize,
        /// Declared payload size.
        expected: u64,
    },
}

/// How a connection should react to a [`CodecError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Discard the offending frame and keep reading.
    Drop,
    /// Close the connection.
    Disconnect,
}

/// Top-level codec error taxonomy.
///
/// # Examples
///
/// ```
/// use wsframe::{CodecError, FramingError, RecoveryPolicy};
///
/// let err = CodecError::Framing(FramingError::OversizedFrame {
///     size: 2000,
///     max: 1024,
/// });
///
/// assert_eq!(err.default_recovery_policy(), RecoveryPolicy::Drop);
/// assert!(!err.should_disconnect());
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Length-field error.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Protocol violation.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Caller contract violation.
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// Transport I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Premature end of stream.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns the recommended recovery policy for this error.
    ///
    /// | Error Type | Policy |
    /// |------------|--------|
    /// | `Framing::OversizedFrame` | `Drop` |
    /// | Other `Framing` errors | `Disconnect` |
    /// | All `Protocol` errors | `Disconnect` |
    /// | All `Usage` errors | `Disconnect` |
    /// | All `Io` and `Eof` errors | `Disconnect` |
    ///
    /// An oversized frame leaves the stream aligned: its declared length is
    /// known, so the payload can be skipped.
    #[must_use]
    pub fn default_recovery_policy(&self) -> RecoveryPolicy {
        match self {
            Self::Framing(FramingError::OversizedFrame { .. }) => RecoveryPolicy::Drop,
            Self::Framing(_) | Self::Protocol(_) | Self::Usage(_) | Self::Io(_) | Self::Eof(_) => {
                RecoveryPolicy::Disconnect
            }
        }
    }

    /// Returns true if the connection should be terminated.
    #[must_use]
    pub fn should_disconnect(&self) -> bool {
        self.default_recovery_policy() == RecoveryPolicy::Disconnect
    }

    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of: `"framing"`, `"protocol"`, `"usage"`, `"io"`, or `"eof"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Protocol(_) => "protocol",
            Self::Usage(_) => "usage",
            Self::Io(_) => "io",
            Self::Eof(_) => "eof",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            CodecError::Framing(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Protocol(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Usage(e) => io::Error::new(io::ErrorKind::InvalidInput, e),
            CodecError::Eof(e) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
