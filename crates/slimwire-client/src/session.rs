//! Framed TCP session against a SlimProto server.
//!
//! Framing on this socket is asymmetric by protocol contract: inbound
//! (server→client) messages carry a 2-byte big-endian length prefix, while
//! outbound (client→server) messages are written raw with their own internal
//! `u32` length header (already produced by the codec).
//!
//! # State Machine
//!
//! ```text
//! Disconnected ──connect──▶ Handshaking ──send(HELO)──▶ Connected
//!      ▲                                                     │
//!      └────────────── disconnect / socket error ────────────┘
//! ```
//!
//! The session is single-owner and not safe for concurrent use: at most one
//! outstanding `send` and one outstanding `receive` at a time.
//!
//! # Cancellation
//!
//! Operations are cancelled by dropping their futures (`tokio::select!`).
//! Dropping `connect` tears down any partially opened socket. Dropping
//! `receive` after the length prefix was consumed leaves the socket in an
//! indeterminate position; `disconnect` before reuse.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use tokio::{
    io::{
        AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, ReadHalf,
        WriteHalf,
    },
    net::TcpStream,
};

use slimwire_proto::{
    CapabilitySet, ClientMessage, Helo, MAX_SERVER_FRAME, ProtocolError, ServerMessage,
};

use crate::error::SessionError;

/// Sentinel MAC announced when the caller has none.
pub const FALLBACK_MAC: [u8; 6] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];

/// Narrow dial capability consumed by [`Session`].
///
/// Production uses [`TcpConnector`]; tests substitute an in-memory byte pipe
/// so session logic runs without a network.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Transport produced by a successful dial.
    type Transport: AsyncRead + AsyncWrite + Unpin + Send;

    /// Open a fresh transport to `addr`.
    async fn connect(&self, addr: SocketAddr) -> io::Result<Self::Transport>;
}

/// Production connector dialing plain TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Transport = TcpStream;

    async fn connect(&self, addr: SocketAddr) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Handshake parameters for the HELO announcement.
///
/// This is the caller-facing shape: the MAC is optional and validated at
/// connect time, before any socket is opened.
#[derive(Debug, Clone)]
pub struct HeloConfig {
    /// Device family identifier.
    pub device_id: u8,
    /// Firmware revision.
    pub revision: u8,
    /// Player MAC address. `None` substitutes [`FALLBACK_MAC`]; any supplied
    /// value must be exactly 6 bytes.
    pub mac: Option<Vec<u8>>,
    /// Player UUID.
    pub uuid: [u8; 16],
    /// WLAN channel bitmap.
    pub wlan_channels: u16,
    /// Stream bytes received before this (re)connect.
    pub bytes_received: u64,
    /// ISO-639 language code.
    pub language: [u8; 2],
    /// Capability announcement; must render to a non-empty string.
    pub capabilities: CapabilitySet,
}

impl Default for HeloConfig {
    fn default() -> Self {
        Self {
            device_id: 12,
            revision: 0,
            mac: None,
            uuid: [0; 16],
            wlan_channels: 0,
            bytes_received: 0,
            language: *b"en",
            capabilities: CapabilitySet::default_set(),
        }
    }
}

impl HeloConfig {
    /// Validate and build the wire message.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InvalidMac`] if a supplied MAC is not 6 bytes.
    /// - [`SessionError::EmptyCapabilities`] if the capability set renders to
    ///   an empty string.
    fn into_message(self) -> Result<ClientMessage, SessionError> {
        let mac = match &self.mac {
            None => FALLBACK_MAC,
            Some(bytes) => <[u8; 6]>::try_from(bytes.as_slice())
                .map_err(|_| SessionError::InvalidMac { len: bytes.len() })?,
        };
        if self.capabilities.to_string().is_empty() {
            return Err(SessionError::EmptyCapabilities);
        }
        Ok(ClientMessage::Helo(Helo {
            device_id: self.device_id,
            revision: self.revision,
            mac,
            uuid: self.uuid,
            wlan_channels: self.wlan_channels,
            bytes_received: self.bytes_received,
            language: self.language,
            capabilities: self.capabilities,
        }))
    }
}

/// Buffered halves of a connected transport.
struct Transport<T> {
    reader: BufReader<ReadHalf<T>>,
    writer: BufWriter<WriteHalf<T>>,
}

/// A SlimProto session owning one TCP connection.
///
/// All byte↔message conversion is delegated to the codec; the session only
/// frames, dials, and tracks connection state. Errors are propagated to the
/// caller, who owns reconnection policy.
pub struct Session<C: Connector = TcpConnector> {
    connector: C,
    endpoint: Option<SocketAddr>,
    transport: Option<Transport<C::Transport>>,
}

impl Session<TcpConnector> {
    /// Create a disconnected session dialing plain TCP.
    #[must_use]
    pub fn new() -> Self {
        Self::with_connector(TcpConnector)
    }
}

impl Default for Session<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> Session<C> {
    /// Create a disconnected session with an injected dialer.
    pub fn with_connector(connector: C) -> Self {
        Self { connector, endpoint: None, transport: None }
    }

    /// Whether the session currently holds a connection.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Endpoint of the current or most recent connection.
    #[must_use]
    pub fn server_endpoint(&self) -> Option<SocketAddr> {
        self.endpoint
    }

    /// Connect to `endpoint` and announce with `helo`.
    ///
    /// Any existing connection is torn down first, so the call is idempotent.
    /// The handshake parameters are validated before any socket is opened;
    /// the HELO goes out as the first message of the new connection.
    pub async fn connect(
        &mut self,
        endpoint: SocketAddr,
        helo: HeloConfig,
    ) -> Result<(), SessionError> {
        let announcement = helo.into_message()?;

        self.transport = None;
        self.endpoint = Some(endpoint);

        let stream = self.connector.connect(endpoint).await?;
        let (read_half, write_half) = tokio::io::split(stream);
        self.transport =
            Some(Transport { reader: BufReader::new(read_half), writer: BufWriter::new(write_half) });
        tracing::debug!(%endpoint, "connected, announcing");

        self.send(&announcement).await
    }

    /// Connect to the cached endpoint again.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotConnected`] if no endpoint was ever connected.
    pub async fn reconnect(&mut self, helo: HeloConfig) -> Result<(), SessionError> {
        let endpoint = self.endpoint.ok_or(SessionError::NotConnected)?;
        self.connect(endpoint, helo).await
    }

    /// Encode `message` and write it raw, then flush.
    ///
    /// Messages appear on the socket in call order; the flush completes
    /// before this returns.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<(), SessionError> {
        let transport = self.transport.as_mut().ok_or(SessionError::NotConnected)?;
        let bytes = message.to_bytes();
        transport.writer.write_all(&bytes).await?;
        transport.writer.flush().await?;
        Ok(())
    }

    /// Read one length-prefixed frame and decode it.
    ///
    /// Frames are yielded in wire order. Unknown opcodes decode to
    /// [`ServerMessage::Unknown`] with the frame captured whole, so they
    /// never desynchronize the stream.
    pub async fn receive(&mut self) -> Result<ServerMessage, SessionError> {
        let transport = self.transport.as_mut().ok_or(SessionError::NotConnected)?;

        let mut prefix = [0u8; 2];
        read_exact_or_closed(&mut transport.reader, &mut prefix).await?;
        let length = usize::from(u16::from_be_bytes(prefix));
        if length > MAX_SERVER_FRAME {
            return Err(ProtocolError::FrameTooLarge { size: length, max: MAX_SERVER_FRAME }.into());
        }

        let mut payload = vec![0u8; length];
        read_exact_or_closed(&mut transport.reader, &mut payload).await?;

        Ok(ServerMessage::decode(&payload)?)
    }

    /// Send a best-effort `BYE!` and tear the connection down.
    ///
    /// Errors from the goodbye are swallowed; afterwards the session is
    /// `Disconnected` and may `connect` again. A no-op when disconnected.
    pub async fn disconnect(&mut self, reason: u8) {
        if let Some(mut transport) = self.transport.take() {
            let goodbye = ClientMessage::Bye { reason }.to_bytes();
            let _ = transport.writer.write_all(&goodbye).await;
            let _ = transport.writer.flush().await;
            let _ = transport.writer.shutdown().await;
            tracing::debug!(reason, "disconnected");
        }
    }
}

/// `read_exact` with EOF mapped to [`SessionError::SocketClosed`].
async fn read_exact_or_closed<R: AsyncRead + Unpin>(
    reader: &mut R,
    buf: &mut [u8],
) -> Result<(), SessionError> {
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
            Err(SessionError::SocketClosed)
        },
        Err(error) => Err(error.into()),
    }
}
