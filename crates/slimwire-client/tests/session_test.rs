//! Session integration tests over an in-memory byte pipe.
//!
//! The dial seam lets these tests hand the session a `tokio::io::duplex`
//! transport: the test plays the server on the other end, byte for byte,
//! including the asymmetric framing (raw client frames out, u16-length-
//! prefixed server frames in).

use std::{
    collections::VecDeque,
    io,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};

use slimwire_client::{
    CapabilitySet, ClientMessage, Connector, FALLBACK_MAC, HeloConfig, ServerMessage, Session,
    SessionError,
};
use slimwire_proto::ProtocolError;

/// Connector handing out pre-staged duplex pipes, oldest dial first.
///
/// Clones share state, so a test can keep one handle while the session owns
/// another.
#[derive(Default, Clone)]
struct PipeConnector {
    inner: Arc<PipeState>,
}

#[derive(Default)]
struct PipeState {
    pipes: Mutex<VecDeque<DuplexStream>>,
    dials: AtomicUsize,
}

impl PipeConnector {
    /// Stage one connection; returns the server end of the pipe.
    fn stage(&self) -> DuplexStream {
        let (client_end, server_end) = duplex(64 * 1024);
        self.inner.pipes.lock().unwrap().push_back(client_end);
        server_end
    }

    fn dial_count(&self) -> usize {
        self.inner.dials.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for PipeConnector {
    type Transport = DuplexStream;

    async fn connect(&self, _addr: SocketAddr) -> io::Result<DuplexStream> {
        self.inner.dials.fetch_add(1, Ordering::SeqCst);
        self.inner
            .pipes
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "no staged pipe"))
    }
}

fn endpoint() -> SocketAddr {
    "127.0.0.1:3483".parse().unwrap()
}

/// Read one raw client frame (opcode + u32 length + payload) from the
/// server end of the pipe.
async fn read_client_frame(server_end: &mut DuplexStream) -> (String, Vec<u8>) {
    let mut header = [0u8; 8];
    server_end.read_exact(&mut header).await.unwrap();
    let opcode = String::from_utf8(header[..4].to_vec()).unwrap();
    let length = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;
    let mut payload = vec![0u8; length];
    server_end.read_exact(&mut payload).await.unwrap();
    (opcode, payload)
}

/// Write one server frame with its u16 big-endian length prefix.
async fn write_server_frame(server_end: &mut DuplexStream, payload: &[u8]) {
    let prefix = (payload.len() as u16).to_be_bytes();
    server_end.write_all(&prefix).await.unwrap();
    server_end.write_all(payload).await.unwrap();
}

async fn connected_session() -> (Session<PipeConnector>, DuplexStream) {
    let connector = PipeConnector::default();
    let mut server_end = connector.stage();
    let mut session = Session::with_connector(connector);
    session.connect(endpoint(), HeloConfig::default()).await.unwrap();
    // Drain the handshake so tests start from a quiet wire.
    let (opcode, _) = read_client_frame(&mut server_end).await;
    assert_eq!(opcode, "HELO");
    (session, server_end)
}

#[tokio::test]
async fn connect_sends_helo_first() {
    let connector = PipeConnector::default();
    let mut server_end = connector.stage();
    let mut session = Session::with_connector(connector);

    session.connect(endpoint(), HeloConfig::default()).await.unwrap();
    assert!(session.is_connected());
    assert_eq!(session.server_endpoint(), Some(endpoint()));

    let (opcode, payload) = read_client_frame(&mut server_end).await;
    assert_eq!(opcode, "HELO");
    // device_id, revision, then the sentinel MAC.
    assert_eq!(payload[0], 12);
    assert_eq!(&payload[2..8], &FALLBACK_MAC);
    let capabilities = String::from_utf8(payload[36..].to_vec()).unwrap();
    assert!(capabilities.starts_with("Model=squeezelite"));
}

#[tokio::test]
async fn bad_mac_fails_before_any_dial() {
    let connector = PipeConnector::default();
    let mut session = Session::with_connector(connector.clone());

    let config = HeloConfig { mac: Some(vec![1, 2, 3]), ..HeloConfig::default() };
    let error = session.connect(endpoint(), config).await.unwrap_err();
    assert!(matches!(error, SessionError::InvalidMac { len: 3 }));
    assert!(!session.is_connected());
    assert_eq!(connector.dial_count(), 0);
}

#[tokio::test]
async fn empty_capabilities_fail_before_any_dial() {
    let connector = PipeConnector::default();
    let mut session = Session::with_connector(connector.clone());

    let config = HeloConfig { capabilities: CapabilitySet::new(), ..HeloConfig::default() };
    let error = session.connect(endpoint(), config).await.unwrap_err();
    assert!(matches!(error, SessionError::EmptyCapabilities));
    assert_eq!(connector.dial_count(), 0);
    assert_eq!(session.server_endpoint(), None);
}

#[tokio::test]
async fn send_and_receive_require_a_connection() {
    let mut session = Session::with_connector(PipeConnector::default());

    let send_error = session.send(&ClientMessage::Bye { reason: 0 }).await.unwrap_err();
    assert!(matches!(send_error, SessionError::NotConnected));

    let receive_error = session.receive().await.unwrap_err();
    assert!(matches!(receive_error, SessionError::NotConnected));
}

#[tokio::test]
async fn sends_appear_in_call_order() {
    let (mut session, mut server_end) = connected_session().await;

    session.send(&ClientMessage::SetName { name: "attic".to_string() }).await.unwrap();
    session.send(&ClientMessage::Bye { reason: 1 }).await.unwrap();

    let (first, first_payload) = read_client_frame(&mut server_end).await;
    assert_eq!(first, "SETD");
    assert_eq!(first_payload, b"\x00attic");

    let (second, second_payload) = read_client_frame(&mut server_end).await;
    assert_eq!(second, "BYE!");
    assert_eq!(second_payload, [1]);
}

#[tokio::test]
async fn framing_survives_byte_at_a_time_delivery() {
    let (mut session, mut server_end) = connected_session().await;

    let payload = b"serv\xC0\xA8\x01\x64sync";
    let mut wire = (payload.len() as u16).to_be_bytes().to_vec();
    wire.extend_from_slice(payload);

    let writer = tokio::spawn(async move {
        for byte in wire {
            server_end.write_all(&[byte]).await.unwrap();
            server_end.flush().await.unwrap();
        }
        server_end
    });

    let message = session.receive().await.unwrap();
    assert_eq!(
        message,
        ServerMessage::Serv {
            ip: "192.168.1.100".parse().unwrap(),
            sync_group_id: Some("sync".to_string()),
        }
    );
    writer.await.unwrap();
}

#[tokio::test]
async fn back_to_back_frames_are_yielded_in_wire_order() {
    let (mut session, mut server_end) = connected_session().await;

    let mut wire = Vec::new();
    for payload in [&b"strmq"[..], &b"strmf"[..], &b"vers9.0.0"[..]] {
        wire.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        wire.extend_from_slice(payload);
    }
    server_end.write_all(&wire).await.unwrap();

    assert_eq!(session.receive().await.unwrap(), ServerMessage::Stop);
    assert_eq!(session.receive().await.unwrap(), ServerMessage::Flush);
    assert_eq!(
        session.receive().await.unwrap(),
        ServerMessage::Version { text: "9.0.0".to_string() }
    );
}

#[tokio::test]
async fn unknown_opcodes_do_not_desynchronize_the_stream() {
    let (mut session, mut server_end) = connected_session().await;

    write_server_frame(&mut server_end, b"XYZQ\x01\x02\x03\x04").await;
    write_server_frame(&mut server_end, b"strmq").await;

    let ServerMessage::Unknown { opcode, raw } = session.receive().await.unwrap() else {
        panic!("expected an unknown message");
    };
    assert_eq!(opcode, "XYZQ");
    assert_eq!(&raw[..], b"XYZQ\x01\x02\x03\x04");

    // The cursor advanced exactly one frame: the next message decodes fine.
    assert_eq!(session.receive().await.unwrap(), ServerMessage::Stop);
}

#[tokio::test]
async fn zero_length_frame_fails_decode_but_preserves_framing() {
    let (mut session, mut server_end) = connected_session().await;

    write_server_frame(&mut server_end, b"").await;
    write_server_frame(&mut server_end, b"strmf").await;

    let error = session.receive().await.unwrap_err();
    assert!(matches!(
        error,
        SessionError::Protocol(ProtocolError::Truncated { needed: 4, available: 0 })
    ));

    assert_eq!(session.receive().await.unwrap(), ServerMessage::Flush);
}

#[tokio::test]
async fn eof_mid_frame_is_socket_closed() {
    let (mut session, mut server_end) = connected_session().await;

    // Length prefix promising 10 bytes, then the server goes away.
    server_end.write_all(&10u16.to_be_bytes()).await.unwrap();
    drop(server_end);

    let error = session.receive().await.unwrap_err();
    assert!(matches!(error, SessionError::SocketClosed));
}

#[tokio::test]
async fn eof_at_frame_boundary_is_socket_closed() {
    let (mut session, server_end) = connected_session().await;
    drop(server_end);

    let error = session.receive().await.unwrap_err();
    assert!(matches!(error, SessionError::SocketClosed));
}

#[tokio::test]
async fn disconnect_says_goodbye_and_the_session_can_reconnect() {
    let connector = PipeConnector::default();
    let mut first_server = connector.stage();
    let mut second_server = connector.stage();
    let mut session = Session::with_connector(connector);

    session.connect(endpoint(), HeloConfig::default()).await.unwrap();
    let (opcode, _) = read_client_frame(&mut first_server).await;
    assert_eq!(opcode, "HELO");

    session.disconnect(55).await;
    assert!(!session.is_connected());

    let (opcode, payload) = read_client_frame(&mut first_server).await;
    assert_eq!(opcode, "BYE!");
    assert_eq!(payload, [55]);

    // The endpoint stays cached for reconnection.
    session.reconnect(HeloConfig::default()).await.unwrap();
    assert!(session.is_connected());
    let (opcode, _) = read_client_frame(&mut second_server).await;
    assert_eq!(opcode, "HELO");
}

#[tokio::test]
async fn disconnect_when_disconnected_is_a_no_op() {
    let mut session = Session::with_connector(PipeConnector::default());
    session.disconnect(0).await;
    assert!(!session.is_connected());
}

#[tokio::test]
async fn reconnect_without_a_cached_endpoint_fails() {
    let mut session = Session::with_connector(PipeConnector::default());
    let error = session.reconnect(HeloConfig::default()).await.unwrap_err();
    assert!(matches!(error, SessionError::NotConnected));
}

#[tokio::test]
async fn connect_twice_replaces_the_connection() {
    let connector = PipeConnector::default();
    let mut first_server = connector.stage();
    let mut second_server = connector.stage();
    let mut session = Session::with_connector(connector.clone());

    session.connect(endpoint(), HeloConfig::default()).await.unwrap();
    let (opcode, _) = read_client_frame(&mut first_server).await;
    assert_eq!(opcode, "HELO");

    let other: SocketAddr = "127.0.0.2:3483".parse().unwrap();
    session.connect(other, HeloConfig::default()).await.unwrap();
    assert_eq!(session.server_endpoint(), Some(other));
    assert_eq!(connector.dial_count(), 2);

    let (opcode, _) = read_client_frame(&mut second_server).await;
    assert_eq!(opcode, "HELO");

    // The first pipe saw no BYE!; its peer is simply gone.
    let mut trailing = [0u8; 1];
    assert!(first_server.read_exact(&mut trailing).await.is_err());
}

#[tokio::test]
async fn helo_carries_the_supplied_mac_and_counters() {
    let connector = PipeConnector::default();
    let mut server_end = connector.stage();
    let mut session = Session::with_connector(connector);

    let config = HeloConfig {
        mac: Some(vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
        bytes_received: 777,
        language: *b"de",
        ..HeloConfig::default()
    };
    session.connect(endpoint(), config).await.unwrap();

    let (_, payload) = read_client_frame(&mut server_end).await;
    assert_eq!(&payload[2..8], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
    assert_eq!(&payload[26..34], &777u64.to_be_bytes());
    assert_eq!(&payload[34..36], b"de");
}
