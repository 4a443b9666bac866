//! SlimProto wire protocol.
//!
//! The typed message model and binary codec spoken between Squeezebox-class
//! players and a Lyrion/Logitech Media Server: big-endian fixed-width fields
//! interleaved with 4-byte ASCII opcodes, a sub-dispatch layer under `strm`
//! and `setd`, the capability announcement string, and the `STAT` counter
//! snapshot.
//!
//! This crate is pure: no I/O, no clock, no async. Sessions and discovery
//! live in `slimwire-client`; this crate only translates between bytes and
//! [`ClientMessage`]/[`ServerMessage`] values.

#![forbid(unsafe_code)]

mod capability;
mod codec;
mod errors;
mod message;
mod status;
pub mod wire;

pub use capability::{Capability, CapabilitySet};
pub use errors::{CapabilityError, ProtocolError, Result};
pub use message::{
    AutoStart, ClientMessage, Helo, PcmChannels, PcmEndian, PcmSampleRate, PcmSampleSize,
    ServerMessage, SpdifMode, StreamFlags, StreamFormat, StreamStart, TransitionType,
};
pub use status::{StatusCode, StatusSnapshot};

/// TCP and UDP port the protocol runs on.
pub const SLIM_PORT: u16 = 3483;

/// Upper bound on one inbound (server→client) frame payload.
///
/// The current length prefix is a `u16`, so real frames sit far below this;
/// the limit is part of the wire contract and is enforced by the session
/// before a payload is buffered.
pub const MAX_SERVER_FRAME: usize = 1024 * 1024;
