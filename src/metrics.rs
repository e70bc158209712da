//! Metric helpers for `wsframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops.

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking processed frames.
pub const FRAMES_PROCESSED: &str = "wsframe_frames_processed_total";
/// Name of the counter tracking codec errors.
pub const ERRORS_TOTAL: &str = "wsframe_errors_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames decoded from the peer.
    Inbound,
    /// Frames encoded for the peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Record a processed frame for the given direction.
#[cfg(feature = "metrics")]
pub fn inc_frames(direction: Direction) {
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
}

/// Record a processed frame for the given direction.
#[cfg(not(feature = "metrics"))]
pub fn inc_frames(_direction: Direction) {}

/// Record a codec error, labelled by [`CodecError::error_type`](crate::CodecError::error_type).
#[cfg(feature = "metrics")]
pub fn inc_errors(error_type: &'static str) {
    counter!(ERRORS_TOTAL, "type" => error_type).increment(1);
}

/// Record a codec error, labelled by [`CodecError::error_type`](crate::CodecError::error_type).
#[cfg(not(feature = "metrics"))]
pub fn inc_errors(_error_type: &'static str) {}
