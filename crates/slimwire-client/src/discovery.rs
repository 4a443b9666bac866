//! UDP discovery of SlimProto servers.
//!
//! The client broadcasts a request datagram and waits for any server to
//! answer. A valid answer starts with ASCII `'E'` followed by TLV records
//! (`token: 4 ASCII bytes, length: u8, value: length bytes`) advertising the
//! server's name, version, address, and web port. The SlimProto endpoint is
//! the datagram's source address at the protocol port 3483 — not the source
//! UDP port.
//!
//! Each call uses a fresh socket, so the service may be shared freely.
//! Cancelling a discovery (dropping the future) returns nothing, never a
//! partial result.

use std::{
    collections::HashMap,
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    time::Duration,
};

use tokio::{net::UdpSocket, time};

use slimwire_proto::SLIM_PORT;

use crate::error::DiscoveryError;

/// Request datagram soliciting server advertisements.
const DISCOVERY_REQUEST: &[u8] = b"eNAME\0IPAD\0JSON\0VERS";

/// First byte of a valid server advertisement.
const RESPONSE_TAG: u8 = b'E';

/// Interval between request re-broadcasts.
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(5);

/// Receive buffer size; advertisements are far below one MTU.
const MAX_DATAGRAM: usize = 1500;

/// One TLV value from a server advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlvValue {
    /// Server display name (`NAME`).
    Name(String),
    /// Server version string (`VERS`).
    Version(String),
    /// Advertised server address (`IPAD`).
    Address(Ipv4Addr),
    /// Advertised web-interface port (`JSON`).
    Port(u16),
}

/// A server located by discovery.
///
/// Produced once and handed to the caller; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct DiscoveredServer {
    /// SlimProto endpoint: advertisement source address at port 3483.
    pub addr: SocketAddrV4,
    /// Parsed TLV records keyed by their 4-character token.
    pub tlv_map: HashMap<String, TlvValue>,
}

impl DiscoveredServer {
    /// Server display name, if advertised.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self.tlv_map.get("NAME") {
            Some(TlvValue::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Server version, if advertised.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        match self.tlv_map.get("VERS") {
            Some(TlvValue::Version(version)) => Some(version),
            _ => None,
        }
    }
}

/// Discovery service configuration.
///
/// The defaults are the protocol constants; the target and interval are
/// settable so tests (and unusual network setups) can aim at a specific
/// responder instead of the broadcast address.
#[derive(Debug, Clone)]
pub struct Discovery {
    target: SocketAddr,
    interval: Duration,
}

impl Default for Discovery {
    fn default() -> Self {
        Self { target: (Ipv4Addr::BROADCAST, SLIM_PORT).into(), interval: BROADCAST_INTERVAL }
    }
}

impl Discovery {
    /// Discovery against the broadcast address with the standard interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Send requests to `target` instead of the broadcast address.
    #[must_use]
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    /// Re-send requests every `interval` instead of the standard 5 s.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Find the first answering server.
    ///
    /// Broadcasts the request, re-sending every interval, and resolves with
    /// the first valid advertisement. `None` when `timeout` elapses first;
    /// waits indefinitely when `timeout` is `None`.
    pub async fn discover(
        &self,
        timeout: Option<Duration>,
    ) -> Result<Option<DiscoveredServer>, DiscoveryError> {
        match timeout {
            Some(limit) => match time::timeout(limit, self.run()).await {
                Ok(result) => result.map(Some),
                Err(_) => {
                    tracing::debug!(?limit, "discovery timed out");
                    Ok(None)
                },
            },
            None => self.run().await.map(Some),
        }
    }

    async fn run(&self) -> Result<DiscoveredServer, DiscoveryError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            socket.send_to(DISCOVERY_REQUEST, self.target).await?;
            tracing::debug!(to = %self.target, "discovery request sent");

            let resend = time::sleep(self.interval);
            tokio::pin!(resend);
            loop {
                tokio::select! {
                    () = &mut resend => break,
                    received = socket.recv_from(&mut buf) => {
                        let (len, source) = received?;
                        if let Some(server) = advertisement(buf.get(..len).unwrap_or_default(), source) {
                            tracing::info!(addr = %server.addr, name = ?server.name(), "server discovered");
                            return Ok(server);
                        }
                    },
                }
            }
        }
    }
}

/// Interpret one datagram; `None` if it is not a server advertisement.
fn advertisement(datagram: &[u8], source: SocketAddr) -> Option<DiscoveredServer> {
    let (&tag, tlv) = datagram.split_first()?;
    if tag != RESPONSE_TAG {
        return None;
    }
    let SocketAddr::V4(source) = source else {
        return None;
    };
    Some(DiscoveredServer {
        addr: SocketAddrV4::new(*source.ip(), SLIM_PORT),
        tlv_map: parse_tlv(tlv),
    })
}

/// Parse the TLV block of a server advertisement (the bytes after `'E'`).
///
/// Parsing stops cleanly when fewer than 5 bytes remain, when a token starts
/// outside printable ASCII, or when a record's advertised length would
/// overrun the buffer. Unrecognized tokens are skipped with their length
/// consumed; records whose value fails to parse (`IPAD`, `JSON`) are skipped
/// too. A repeated token overwrites the earlier record.
#[must_use]
pub fn parse_tlv(block: &[u8]) -> HashMap<String, TlvValue> {
    let mut map = HashMap::new();
    let mut rest = block;

    while rest.len() >= 5 {
        if !matches!(rest[0], 0x20..=0x7E) {
            break;
        }
        let token = &rest[..4];
        let length = usize::from(rest[4]);
        let Some(value) = rest.get(5..5 + length) else {
            break;
        };

        let parsed = match token {
            b"NAME" => Some(TlvValue::Name(String::from_utf8_lossy(value).into_owned())),
            b"VERS" => Some(TlvValue::Version(String::from_utf8_lossy(value).into_owned())),
            b"IPAD" => std::str::from_utf8(value)
                .ok()
                .and_then(|text| text.parse().ok())
                .map(TlvValue::Address),
            b"JSON" => std::str::from_utf8(value)
                .ok()
                .and_then(|text| text.parse().ok())
                .map(TlvValue::Port),
            _ => None,
        };
        if let Some(value) = parsed {
            map.insert(String::from_utf8_lossy(token).into_owned(), value);
        }

        rest = &rest[5 + length..];
    }

    map
}
