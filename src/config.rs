//! Codec configuration.
//!
//! RFC 6455 assigns masking by endpoint role: clients mask every frame they
//! send, servers never do, and each side rejects frames that break the rule.
//! [`CodecConfig`] carries that role together with the frame-size ceiling
//! applied by [`WebSocketFrameCodec`](crate::codec::WebSocketFrameCodec).

use std::fmt;

/// Minimum configurable frame length in bytes.
///
/// Room for the largest control frame.
pub const MIN_FRAME_LENGTH: usize = 125;

/// Maximum configurable frame length in bytes (16 MiB).
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Frame length used when none is configured (1 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 1024 * 1024;

pub(crate) fn clamp_frame_length(value: usize) -> usize {
    value.clamp(MIN_FRAME_LENGTH, MAX_FRAME_LENGTH)
}

/// Which end of the connection this codec serves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    /// Accepts masked frames, sends unmasked frames.
    #[default]
    Server,
    /// Accepts unmasked frames, sends masked frames.
    Client,
}

impl Role {
    /// Report whether frames received in this role must be masked.
    #[must_use]
    pub const fn expects_masked_input(self) -> bool { matches!(self, Self::Server) }

    /// Report whether frames sent in this role must be masked.
    #[must_use]
    pub const fn masks_output(self) -> bool { matches!(self, Self::Client) }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Server => "server",
            Self::Client => "client",
        })
    }
}

/// Settings for [`WebSocketFrameCodec`](crate::codec::WebSocketFrameCodec).
///
/// # Examples
///
/// ```
/// use wsframe::{CodecConfig, Role, config::MAX_FRAME_LENGTH};
///
/// let config = CodecConfig::new(Role::Client).with_max_frame_length(usize::MAX);
/// assert_eq!(config.role(), Role::Client);
/// assert_eq!(config.max_frame_length(), MAX_FRAME_LENGTH);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    role: Role,
    max_frame_length: usize,
}

impl CodecConfig {
    /// Configuration for `role` with the default frame-length ceiling.
    #[must_use]
    pub const fn new(role: Role) -> Self {
        Self {
            role,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    /// Change the endpoint role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Cap accepted and emitted payloads at `max_frame_length` bytes.
    ///
    /// The value is clamped to [`MIN_FRAME_LENGTH`]..=[`MAX_FRAME_LENGTH`].
    #[must_use]
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = clamp_frame_length(max_frame_length);
        self
    }

    /// Return the endpoint role.
    #[must_use]
    pub const fn role(&self) -> Role { self.role }

    /// Return the payload ceiling in bytes.
    #[must_use]
    pub const fn max_frame_length(&self) -> usize { self.max_frame_length }
}

impl Default for CodecConfig {
    fn default() -> Self { Self::new(Role::default()) }
}
