//! Error types for SlimProto wire handling.
//!
//! The codec recovers nothing locally: it either returns a typed message
//! (possibly `Unknown`) or fails with one of these errors. Unrecognized
//! opcodes are deliberately NOT errors — they decode to
//! [`ServerMessage::Unknown`](crate::ServerMessage::Unknown) so the frame
//! stream never desynchronizes.

use thiserror::Error;

/// Convenience result alias for codec operations.
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors raised while encoding or decoding wire bytes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input ended before the minimum a decoder needs.
    ///
    /// The frame boundary is preserved: the decoder consumed nothing beyond
    /// the frame handed to it.
    #[error("truncated input: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the decoder required at the failing read.
        needed: usize,
        /// Bytes that were actually available.
        available: usize,
    },

    /// A field was present but carried an invalid value.
    #[error("invalid {field} byte {value:#04x}")]
    InvalidField {
        /// Name of the offending wire field.
        field: &'static str,
        /// The rejected byte.
        value: u8,
    },

    /// An inbound frame advertised a length above the protocol limit.
    #[error("frame of {size} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Advertised frame size.
        size: usize,
        /// Maximum the protocol permits.
        max: usize,
    },
}

/// Errors raised while building capability entries.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityError {
    /// A custom capability token must not be empty.
    #[error("custom capability token is empty")]
    EmptyToken,
}
