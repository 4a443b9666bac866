//! Byte ↔ message translation.
//!
//! Framing is asymmetric by protocol contract. Outbound (client→server)
//! messages are written raw and carry their own header:
//!
//! ```text
//! [opcode: 4 ASCII bytes][payload_length: u32 BE][payload]
//! ```
//!
//! Inbound (server→client) payloads arrive already de-framed by the session
//! (which strips a `u16` length prefix) and start directly with their 4-byte
//! opcode. Client opcodes are uppercase, server opcodes lowercase, and the
//! comparison is case-sensitive.
//!
//! # Invariants
//!
//! - Decode never drops bytes: unrecognized opcodes (and unrecognized
//!   `strm`/`setd` sub-commands) return [`ServerMessage::Unknown`] holding
//!   the complete input, so one inbound frame always maps to exactly one
//!   variant and the stream stays aligned.
//! - Malformed payloads behind a known opcode fail loudly with
//!   [`ProtocolError`]; nothing is guessed.

use std::{net::Ipv4Addr, time::Duration};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    errors::{ProtocolError, Result},
    message::{
        AutoStart, ClientMessage, PcmChannels, PcmEndian, PcmSampleRate, PcmSampleSize,
        ServerMessage, SpdifMode, StreamFlags, StreamFormat, StreamStart, TransitionType,
    },
    status::StatusSnapshot,
    wire::Cursor,
};

// Client→server opcodes.
const OP_HELO: [u8; 4] = *b"HELO";
const OP_STAT: [u8; 4] = *b"STAT";
const OP_BYE: [u8; 4] = *b"BYE!";
const OP_SETD: [u8; 4] = *b"SETD";

/// Fixed HELO payload bytes ahead of the capability string.
const HELO_FIXED_LEN: usize = 1 + 1 + 6 + 16 + 2 + 8 + 2;

/// Q16.16 divisor for gain and replay-gain fields.
const FIXED_POINT_ONE: f64 = 65_536.0;

impl ClientMessage {
    /// The 4-byte ASCII opcode for this message.
    #[must_use]
    pub const fn opcode(&self) -> [u8; 4] {
        match self {
            Self::Helo(_) => OP_HELO,
            Self::Stat { .. } => OP_STAT,
            Self::Bye { .. } => OP_BYE,
            Self::SetName { .. } => OP_SETD,
        }
    }

    /// Serialize the message, internal length header included.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.opcode());
        match self {
            Self::Helo(helo) => {
                let capabilities = helo.capabilities.to_string();
                dst.put_u32((HELO_FIXED_LEN + capabilities.len()) as u32);
                dst.put_u8(helo.device_id);
                dst.put_u8(helo.revision);
                dst.put_slice(&helo.mac);
                dst.put_slice(&helo.uuid);
                dst.put_u16(helo.wlan_channels);
                dst.put_u64(helo.bytes_received);
                dst.put_slice(&helo.language);
                dst.put_slice(capabilities.as_bytes());
            },
            Self::Stat { event_code, status } => {
                dst.put_u32((4 + StatusSnapshot::WIRE_SIZE) as u32);
                dst.put_slice(event_code);
                status.encode(dst);
            },
            Self::Bye { reason } => {
                dst.put_u32(1);
                dst.put_u8(*reason);
            },
            Self::SetName { name } => {
                dst.put_u32((1 + name.len()) as u32);
                // Leading tag byte selects the player-name setting.
                dst.put_u8(0x00);
                dst.put_slice(name.as_bytes());
            },
        }
    }

    /// Serialize into a freshly allocated buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.encode(&mut buf);
        buf.freeze()
    }
}

impl ServerMessage {
    /// Decode one de-framed server payload (opcode included, length prefix
    /// already stripped by the session).
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Truncated`] if the input is shorter than 4 bytes or
    ///   a recognized opcode's payload ends early.
    /// - [`ProtocolError::InvalidField`] if a recognized payload carries an
    ///   invalid enum character.
    pub fn decode(input: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(input);
        let opcode = cur.read_array::<4>()?;
        match &opcode {
            b"serv" => decode_serv(cur),
            b"strm" => decode_strm(cur, input),
            b"aude" => decode_aude(cur),
            b"audg" => decode_audg(cur),
            b"vers" => Ok(Self::Version { text: ascii(cur.rest()) }),
            b"setd" => decode_setd(cur, input),
            _ => Ok(unknown(ascii(&opcode), input)),
        }
    }
}

fn unknown(opcode: String, input: &[u8]) -> ServerMessage {
    ServerMessage::Unknown { opcode, raw: Bytes::copy_from_slice(input) }
}

fn ascii(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn decode_serv(mut cur: Cursor<'_>) -> Result<ServerMessage> {
    let ip = Ipv4Addr::from(cur.read_array::<4>()?);
    let rest = cur.rest();
    let sync_group_id = if rest.is_empty() { None } else { Some(ascii(rest)) };
    Ok(ServerMessage::Serv { ip, sync_group_id })
}

/// `strm` is a second dispatch layer: byte 0 of the payload is a command
/// character, and all documented field offsets count from the byte after it.
fn decode_strm(mut cur: Cursor<'_>, input: &[u8]) -> Result<ServerMessage> {
    let command = cur.read_u8()?;
    match command {
        b't' => Ok(ServerMessage::StatusRequest { interval: strm_timestamp(cur)? }),
        b's' => decode_stream_start(cur),
        b'q' => Ok(ServerMessage::Stop),
        b'f' => Ok(ServerMessage::Flush),
        b'p' => Ok(ServerMessage::Pause { timestamp: strm_timestamp(cur)? }),
        b'u' => Ok(ServerMessage::Unpause { timestamp: strm_timestamp(cur)? }),
        b'a' => Ok(ServerMessage::Skip { timestamp: strm_timestamp(cur)? }),
        other => Ok(unknown(format!("strm_{}", char::from(other)), input)),
    }
}

/// Millisecond field shared by `strm t/p/u/a`: a `u32` at offset 13 of the
/// post-command bytes. The 13 bytes before it are not interpreted.
fn strm_timestamp(mut cur: Cursor<'_>) -> Result<Duration> {
    if cur.remaining() < 17 {
        return Err(ProtocolError::Truncated { needed: 17, available: cur.remaining() });
    }
    cur.take(13)?;
    Ok(Duration::from_millis(u64::from(cur.read_u32()?)))
}

fn decode_stream_start(mut cur: Cursor<'_>) -> Result<ServerMessage> {
    if cur.remaining() < 23 {
        return Err(ProtocolError::Truncated { needed: 23, available: cur.remaining() });
    }
    let auto_start = AutoStart::from_wire(cur.read_u8()?)?;
    let format = StreamFormat::from_wire(cur.read_u8()?)?;
    let pcm_sample_size = PcmSampleSize::from_wire(cur.read_u8()?)?;
    let pcm_sample_rate = PcmSampleRate::from_wire(cur.read_u8()?)?;
    let pcm_channels = PcmChannels::from_wire(cur.read_u8()?)?;
    let pcm_endian = PcmEndian::from_wire(cur.read_u8()?)?;
    let threshold = u32::from(cur.read_u8()?) * 1024;
    let spdif = SpdifMode::from_wire(cur.read_u8()?)?;
    let transition_period = Duration::from_secs(u64::from(cur.read_u8()?));
    let transition_type = TransitionType::from_wire(cur.read_u8()?)?;
    let flags = StreamFlags::from_byte(cur.read_u8()?);
    let output_threshold = Duration::from_millis(u64::from(cur.read_u8()?) * 10);
    cur.read_u8()?; // reserved
    let replay_gain = f64::from(cur.read_u32()?) / FIXED_POINT_ONE;
    let server_port = cur.read_u16()?;
    let server_ip = Ipv4Addr::from(cur.read_array::<4>()?);
    let rest = cur.rest();
    let http_headers = if rest.is_empty() { None } else { Some(ascii(rest)) };

    Ok(ServerMessage::Stream(Box::new(StreamStart {
        auto_start,
        format,
        pcm_sample_size,
        pcm_sample_rate,
        pcm_channels,
        pcm_endian,
        threshold,
        spdif,
        transition_period,
        transition_type,
        flags,
        output_threshold,
        replay_gain,
        server_port,
        server_ip,
        http_headers,
    })))
}

fn decode_aude(mut cur: Cursor<'_>) -> Result<ServerMessage> {
    if cur.remaining() < 2 {
        return Err(ProtocolError::Truncated { needed: 2, available: cur.remaining() });
    }
    let spdif = cur.read_u8()? != 0;
    let dac = cur.read_u8()? != 0;
    Ok(ServerMessage::Enable { spdif, dac })
}

/// The first 10 payload bytes of `audg` are legacy fields this client does
/// not interpret; the two Q16.16 gains follow.
fn decode_audg(mut cur: Cursor<'_>) -> Result<ServerMessage> {
    if cur.remaining() < 18 {
        return Err(ProtocolError::Truncated { needed: 18, available: cur.remaining() });
    }
    cur.take(10)?;
    let left = f64::from(cur.read_u32()?) / FIXED_POINT_ONE;
    let right = f64::from(cur.read_u32()?) / FIXED_POINT_ONE;
    Ok(ServerMessage::Gain { left, right })
}

fn decode_setd(mut cur: Cursor<'_>, input: &[u8]) -> Result<ServerMessage> {
    let id = cur.read_u8()?;
    match id {
        0 => {
            let rest = cur.rest();
            match rest.split_last() {
                None => Ok(ServerMessage::QueryName),
                // The final byte is a NUL terminator and is dropped.
                Some((_, name)) => Ok(ServerMessage::SetNameRequest { name: ascii(name) }),
            }
        },
        4 => Ok(ServerMessage::DisableDac),
        other => Ok(unknown(format!("setd_{other}"), input)),
    }
}
