//! Typed SlimProto messages.
//!
//! Two closed sums cover the whole protocol: [`ClientMessage`] for the
//! client→server direction and [`ServerMessage`] for server→client. Decoders
//! return the variant directly and senders match once on the variant, so the
//! opcode table in the codec stays the single source of truth and
//! exhaustiveness is checked at compile time.
//!
//! # Invariants
//!
//! - Every byte sequence with at least a 4-byte opcode decodes to exactly one
//!   [`ServerMessage`] variant; unrecognized opcodes map to
//!   [`ServerMessage::Unknown`] with the full input captured.
//! - No decode path loses bytes: either a typed variant owns the interpreted
//!   payload or `Unknown` owns the raw frame.

use std::{net::Ipv4Addr, time::Duration};

use bytes::Bytes;

use crate::{
    capability::CapabilitySet,
    errors::{ProtocolError, Result},
    status::StatusSnapshot,
};

/// Client announcement sent as the first message of every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Helo {
    /// Device family identifier (12 is the softsqueeze/squeezelite class).
    pub device_id: u8,
    /// Firmware revision reported to the server.
    pub revision: u8,
    /// Player MAC address; the server keys player state on it.
    pub mac: [u8; 6],
    /// Player UUID.
    pub uuid: [u8; 16],
    /// WLAN channel bitmap (zero for wired players).
    pub wlan_channels: u16,
    /// Stream bytes received before this (re)connect.
    pub bytes_received: u64,
    /// ISO-639 language code, raw ASCII.
    pub language: [u8; 2],
    /// Capability announcement rendered into the HELO payload.
    pub capabilities: CapabilitySet,
}

/// Messages sent from the client to the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Session announcement (`HELO`).
    Helo(Helo),
    /// Playback status report (`STAT`).
    Stat {
        /// 4-byte ASCII event code (see [`StatusCode`](crate::StatusCode)).
        event_code: [u8; 4],
        /// Counter snapshot accompanying the event.
        status: StatusSnapshot,
    },
    /// Graceful goodbye (`BYE!`).
    Bye {
        /// Disconnect reason byte.
        reason: u8,
    },
    /// Player name update (`SETD`).
    SetName {
        /// New player name, ASCII.
        name: String,
    },
}

/// How the server wants the client to begin playback of a new stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStart {
    /// Buffer only; wait for an explicit unpause.
    None,
    /// Start as soon as the buffer threshold is reached.
    Auto,
    /// Direct streaming, started explicitly.
    Direct,
    /// Direct streaming, autostarted.
    AutoDirect,
}

impl AutoStart {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            b'0' => Ok(Self::None),
            b'1' => Ok(Self::Auto),
            b'2' => Ok(Self::Direct),
            b'3' => Ok(Self::AutoDirect),
            _ => Err(ProtocolError::InvalidField { field: "auto_start", value }),
        }
    }
}

/// Audio container/codec of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Raw PCM.
    Pcm,
    /// MPEG-1 layer 3.
    Mp3,
    /// FLAC.
    Flac,
    /// Windows Media Audio.
    Wma,
    /// Ogg Vorbis.
    Ogg,
    /// AAC.
    Aac,
    /// Apple Lossless.
    Alac,
}

impl StreamFormat {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            b'p' => Ok(Self::Pcm),
            b'm' => Ok(Self::Mp3),
            b'f' => Ok(Self::Flac),
            b'w' => Ok(Self::Wma),
            b'o' => Ok(Self::Ogg),
            b'a' => Ok(Self::Aac),
            b'l' => Ok(Self::Alac),
            _ => Err(ProtocolError::InvalidField { field: "format", value }),
        }
    }
}

/// PCM sample width of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmSampleSize {
    /// 8-bit samples.
    Eight,
    /// 16-bit samples.
    Sixteen,
    /// 20-bit samples.
    Twenty,
    /// 32-bit samples.
    ThirtyTwo,
    /// Width is described by the stream itself.
    SelfDescribing,
}

impl PcmSampleSize {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            b'0' => Ok(Self::Eight),
            b'1' => Ok(Self::Sixteen),
            b'2' => Ok(Self::Twenty),
            b'3' => Ok(Self::ThirtyTwo),
            b'?' => Ok(Self::SelfDescribing),
            _ => Err(ProtocolError::InvalidField { field: "pcm_sample_size", value }),
        }
    }
}

/// PCM sample rate of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmSampleRate {
    /// Fixed rate in Hz.
    Rate(u32),
    /// Rate is described by the stream itself.
    SelfDescribing,
}

impl PcmSampleRate {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            b'0' => Ok(Self::Rate(11_025)),
            b'1' => Ok(Self::Rate(22_050)),
            b'2' => Ok(Self::Rate(32_000)),
            b'3' => Ok(Self::Rate(44_100)),
            b'4' => Ok(Self::Rate(48_000)),
            b'5' => Ok(Self::Rate(8_000)),
            b'6' => Ok(Self::Rate(12_000)),
            b'7' => Ok(Self::Rate(16_000)),
            b'8' => Ok(Self::Rate(24_000)),
            b'9' => Ok(Self::Rate(96_000)),
            b'?' => Ok(Self::SelfDescribing),
            _ => Err(ProtocolError::InvalidField { field: "pcm_sample_rate", value }),
        }
    }
}

/// PCM channel count of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmChannels {
    /// One channel.
    Mono,
    /// Two channels.
    Stereo,
    /// Channel count is described by the stream itself.
    SelfDescribing,
}

impl PcmChannels {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            b'1' => Ok(Self::Mono),
            b'2' => Ok(Self::Stereo),
            b'?' => Ok(Self::SelfDescribing),
            _ => Err(ProtocolError::InvalidField { field: "pcm_channels", value }),
        }
    }
}

/// PCM byte order of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmEndian {
    /// Big-endian samples.
    Big,
    /// Little-endian samples.
    Little,
    /// Byte order is described by the stream itself.
    SelfDescribing,
}

impl PcmEndian {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            b'0' => Ok(Self::Big),
            b'1' => Ok(Self::Little),
            b'?' => Ok(Self::SelfDescribing),
            _ => Err(ProtocolError::InvalidField { field: "pcm_endian", value }),
        }
    }
}

/// S/PDIF output policy for a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpdifMode {
    /// Leave S/PDIF in its current state.
    Auto,
    /// Force S/PDIF on.
    On,
    /// Force S/PDIF off.
    Off,
}

impl SpdifMode {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Auto),
            1 => Ok(Self::On),
            2 => Ok(Self::Off),
            _ => Err(ProtocolError::InvalidField { field: "spdif_enable", value }),
        }
    }
}

/// Transition applied between the current and the next track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionType {
    /// No transition.
    None,
    /// Crossfade.
    Crossfade,
    /// Fade in.
    FadeIn,
    /// Fade out.
    FadeOut,
    /// Fade out then in.
    FadeInOut,
}

impl TransitionType {
    pub(crate) fn from_wire(value: u8) -> Result<Self> {
        match value {
            b'0' => Ok(Self::None),
            b'1' => Ok(Self::Crossfade),
            b'2' => Ok(Self::FadeIn),
            b'3' => Ok(Self::FadeOut),
            b'4' => Ok(Self::FadeInOut),
            _ => Err(ProtocolError::InvalidField { field: "transition_type", value }),
        }
    }
}

/// Stream option bitfield carried in the `strm s` command.
///
/// Bits other than the four defined here are ignored on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamFlags {
    /// Bit 7: loop the stream indefinitely.
    pub infinite_loop: bool,
    /// Bit 6: keep the decoder running across the track change.
    pub no_restart_decoder: bool,
    /// Bit 1: invert polarity of the right channel.
    pub invert_polarity_right: bool,
    /// Bit 0: invert polarity of the left channel.
    pub invert_polarity_left: bool,
}

impl StreamFlags {
    const INFINITE_LOOP: u8 = 0b1000_0000;
    const NO_RESTART_DECODER: u8 = 0b0100_0000;
    const INVERT_POLARITY_RIGHT: u8 = 0b0000_0010;
    const INVERT_POLARITY_LEFT: u8 = 0b0000_0001;

    /// Parse the wire bitfield.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self {
            infinite_loop: byte & Self::INFINITE_LOOP != 0,
            no_restart_decoder: byte & Self::NO_RESTART_DECODER != 0,
            invert_polarity_right: byte & Self::INVERT_POLARITY_RIGHT != 0,
            invert_polarity_left: byte & Self::INVERT_POLARITY_LEFT != 0,
        }
    }

    /// Render back to the wire bitfield.
    #[must_use]
    pub fn to_byte(self) -> u8 {
        let mut byte = 0;
        if self.infinite_loop {
            byte |= Self::INFINITE_LOOP;
        }
        if self.no_restart_decoder {
            byte |= Self::NO_RESTART_DECODER;
        }
        if self.invert_polarity_right {
            byte |= Self::INVERT_POLARITY_RIGHT;
        }
        if self.invert_polarity_left {
            byte |= Self::INVERT_POLARITY_LEFT;
        }
        byte
    }
}

/// Full parameter block of a `strm s` (start stream) command.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStart {
    /// Playback start policy.
    pub auto_start: AutoStart,
    /// Stream codec.
    pub format: StreamFormat,
    /// PCM sample width.
    pub pcm_sample_size: PcmSampleSize,
    /// PCM sample rate.
    pub pcm_sample_rate: PcmSampleRate,
    /// PCM channel count.
    pub pcm_channels: PcmChannels,
    /// PCM byte order.
    pub pcm_endian: PcmEndian,
    /// Input buffer threshold in bytes before playback may start.
    pub threshold: u32,
    /// S/PDIF output policy.
    pub spdif: SpdifMode,
    /// Transition duration.
    pub transition_period: Duration,
    /// Transition style.
    pub transition_type: TransitionType,
    /// Stream option bits.
    pub flags: StreamFlags,
    /// Output buffer threshold before playback may start.
    pub output_threshold: Duration,
    /// Per-track loudness correction factor (Q16.16 on the wire).
    pub replay_gain: f64,
    /// TCP port of the stream source.
    pub server_port: u16,
    /// IPv4 address of the stream source.
    pub server_ip: Ipv4Addr,
    /// HTTP request header block to send to the stream source, if any.
    pub http_headers: Option<String>,
}

/// Messages sent from the server to the client.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Move to another server (`serv`).
    Serv {
        /// Address of the new server.
        ip: Ipv4Addr,
        /// Sync group to rejoin after the move, if any.
        sync_group_id: Option<String>,
    },
    /// Request for a timed status report (`strm t`).
    StatusRequest {
        /// Server-chosen reporting interval.
        interval: Duration,
    },
    /// Start a new stream (`strm s`).
    Stream(Box<StreamStart>),
    /// Stop playback and flush buffers (`strm q`).
    Stop,
    /// Flush buffers without stopping the connection (`strm f`).
    Flush,
    /// Pause playback (`strm p`).
    Pause {
        /// Server timestamp accompanying the pause.
        timestamp: Duration,
    },
    /// Resume playback (`strm u`).
    Unpause {
        /// Server timestamp accompanying the resume.
        timestamp: Duration,
    },
    /// Skip ahead within the current track (`strm a`).
    Skip {
        /// Amount to skip.
        timestamp: Duration,
    },
    /// Enable or disable audio outputs (`aude`).
    Enable {
        /// S/PDIF output enabled.
        spdif: bool,
        /// DAC output enabled.
        dac: bool,
    },
    /// Volume change (`audg`), already converted from Q16.16 fixed point.
    Gain {
        /// Left channel gain factor.
        left: f64,
        /// Right channel gain factor.
        right: f64,
    },
    /// Server asks for the player name (`setd 0` with no payload).
    QueryName,
    /// Server pushes a new player name (`setd 0` with payload).
    SetNameRequest {
        /// New name with the trailing NUL stripped.
        name: String,
    },
    /// Server disables the DAC (`setd 4`).
    DisableDac,
    /// Server version announcement (`vers`).
    Version {
        /// Version string, ASCII.
        text: String,
    },
    /// Any frame this client does not recognize.
    ///
    /// Carries the opcode (with a `strm_`/`setd_` prefix for unrecognized
    /// sub-commands) and the complete frame payload, so nothing is lost and
    /// the stream stays aligned.
    Unknown {
        /// Opcode, or `"<prefix>_<sub>"` for sub-dispatch misses.
        opcode: String,
        /// The full frame as received.
        raw: Bytes,
    },
}
