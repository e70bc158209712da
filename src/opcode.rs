//! Frame opcodes.
//!
//! The opcode occupies the low nibble of the first header byte. Only the six
//! code points defined by RFC 6455 are representable; every other nibble is
//! rejected at decode time so a constructed [`Opcode`] is always meaningful.

use std::fmt;

use crate::error::ProtocolError;

/// Operation code carried by every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Continues a fragmented message started by a Text or Binary frame.
    Continuation,
    /// UTF-8 text data.
    Text,
    /// Arbitrary binary data.
    Binary,
    /// Connection close.
    Close,
    /// Liveness probe.
    Ping,
    /// Reply to a [`Opcode::Ping`].
    Pong,
}

impl Opcode {
    /// Return the 4-bit wire code point.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsframe::Opcode;
    ///
    /// assert_eq!(Opcode::Binary.code(), 0x2);
    /// assert_eq!(Opcode::Pong.code(), 0xA);
    /// ```
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }

    /// Report whether this opcode denotes a control frame.
    ///
    /// Control frames cannot be fragmented and carry at most
    /// [`MAX_CONTROL_PAYLOAD`](crate::header::MAX_CONTROL_PAYLOAD) bytes.
    #[must_use]
    pub const fn is_control(self) -> bool { matches!(self, Self::Close | Self::Ping | Self::Pong) }

    /// Report whether this opcode denotes a data frame.
    #[must_use]
    pub const fn is_data(self) -> bool { !self.is_control() }

    /// Lower-case name used in logs and by the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuation => "continuation",
            Self::Text => "text",
            Self::Binary => "binary",
            Self::Close => "close",
            Self::Ping => "ping",
            Self::Pong => "pong",
        }
    }
}

impl TryFrom<u8> for Opcode {
    type Error = ProtocolError;

    /// Map a code point onto an [`Opcode`].
    ///
    /// Only the low nibble is inspected; the caller is expected to have
    /// masked off the flag bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use wsframe::{Opcode, ProtocolError};
    ///
    /// assert_eq!(Opcode::try_from(0x1), Ok(Opcode::Text));
    /// assert_eq!(
    ///     Opcode::try_from(0x3),
    ///     Err(ProtocolError::UnknownOpcode { code: 0x3 })
    /// );
    /// ```
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code & 0x0F {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            other => Err(ProtocolError::UnknownOpcode { code: other }),
        }
    }
}

impl From<Opcode> for u8 {
    fn from(opcode: Opcode) -> Self { opcode.code() }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
