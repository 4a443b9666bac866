//! Client-side error types.
//!
//! The session recovers nothing locally: every error propagates to the
//! caller, who owns reconnection policy. Argument validation errors are
//! raised before any socket is opened.

use std::io;

use thiserror::Error;

use slimwire_proto::ProtocolError;

/// Errors raised by [`Session`](crate::Session) operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// `send` or `receive` was called before `connect`.
    #[error("session is not connected")]
    NotConnected,

    /// The server closed the connection; surfaced as end-of-stream.
    #[error("server closed the connection")]
    SocketClosed,

    /// A MAC address was supplied with the wrong length.
    #[error("MAC address must be 6 bytes, got {len}")]
    InvalidMac {
        /// Length of the rejected address.
        len: usize,
    },

    /// The capability set rendered to an empty announcement.
    #[error("rendered capability string is empty")]
    EmptyCapabilities,

    /// An inbound frame failed to decode.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Underlying socket failure.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by [`Discovery`](crate::Discovery).
///
/// An elapsed discovery timeout is NOT an error; it yields `Ok(None)`.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Underlying socket failure.
    #[error("socket error: {0}")]
    Io(#[from] io::Error),
}
