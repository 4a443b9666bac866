//! SlimProto client core.
//!
//! Everything a Squeezebox-class player needs to talk to a Lyrion/Logitech
//! Media Server, short of playing audio:
//!
//! - [`Session`]: a framed TCP session driving the handshake and
//!   request/response loop (length-prefixed inbound, raw outbound).
//! - [`Discovery`]: UDP broadcast discovery of servers on the local network.
//! - [`StatusTracker`]: playback counters and `STAT` message production on an
//!   injected monotonic [`Clock`].
//!
//! The audio pipeline is an external consumer: it receives typed
//! [`ServerMessage`]s from the session, fetches and plays streams itself, and
//! feeds playback events back through the tracker and [`Session::send`].

#![forbid(unsafe_code)]

mod clock;
mod discovery;
mod error;
mod session;
mod status;

pub use clock::{Clock, SystemClock};
pub use discovery::{
    BROADCAST_INTERVAL, DiscoveredServer, Discovery, TlvValue, parse_tlv,
};
pub use error::{DiscoveryError, SessionError};
pub use session::{Connector, FALLBACK_MAC, HeloConfig, Session, TcpConnector};
pub use status::StatusTracker;

pub use slimwire_proto as proto;
pub use slimwire_proto::{
    CapabilitySet, ClientMessage, SLIM_PORT, ServerMessage, StatusCode,
};
