//! Playback status snapshot and event codes.
//!
//! A [`StatusSnapshot`] is the 49-byte counter block carried in every `STAT`
//! message. Layout on the wire (all integers big-endian):
//!
//! ```text
//! crlf: u8, reserved: u16 (always 0), buffer_size: u32, fullness: u32,
//! bytes_received: u64, signal_strength: u16, jiffies_ms: u32,
//! output_buffer_size: u32, output_buffer_fullness: u32,
//! elapsed_seconds: u32, voltage: u16, elapsed_ms: u32, timestamp_ms: u32,
//! error_code: u16
//! ```

use bytes::BufMut;

/// Counter block reported to the server with every `STAT`.
///
/// Counters wrap on overflow, never saturate; `jiffies_ms` is owned by the
/// status tracker and derived from its monotonic clock, not set by callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Count of CR/LF pairs seen in stream headers (wraps at 256).
    pub crlf: u8,
    /// Input buffer size in bytes.
    pub buffer_size: u32,
    /// Input buffer fill level in bytes.
    pub fullness: u32,
    /// Total stream bytes received (wraps at 2^64).
    pub bytes_received: u64,
    /// Wireless signal strength; 0xFFFF on wired players.
    pub signal_strength: u16,
    /// Player uptime in milliseconds, derived from the monotonic clock.
    pub jiffies_ms: u32,
    /// Output buffer size in bytes.
    pub output_buffer_size: u32,
    /// Output buffer fill level in bytes.
    pub output_buffer_fullness: u32,
    /// Seconds of the current track played so far.
    pub elapsed_seconds: u32,
    /// Supply voltage; zero on mains-powered players.
    pub voltage: u16,
    /// Milliseconds of the current track played so far.
    pub elapsed_ms: u32,
    /// Echo of the server timestamp from the request being answered.
    pub timestamp_ms: u32,
    /// Last error code, zero when healthy.
    pub error_code: u16,
}

impl StatusSnapshot {
    /// Serialized size of the snapshot in bytes.
    pub const WIRE_SIZE: usize = 49;

    /// Serialize the snapshot in wire order.
    ///
    /// The reserved `u16` after `crlf` is always written as zero.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_u8(self.crlf);
        dst.put_u16(0);
        dst.put_u32(self.buffer_size);
        dst.put_u32(self.fullness);
        dst.put_u64(self.bytes_received);
        dst.put_u16(self.signal_strength);
        dst.put_u32(self.jiffies_ms);
        dst.put_u32(self.output_buffer_size);
        dst.put_u32(self.output_buffer_fullness);
        dst.put_u32(self.elapsed_seconds);
        dst.put_u16(self.voltage);
        dst.put_u32(self.elapsed_ms);
        dst.put_u32(self.timestamp_ms);
        dst.put_u16(self.error_code);
    }
}

/// Playback events a client reports via `STAT`.
///
/// Each maps to a 4-byte ASCII event code understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// TCP connection to the stream source established (`STMc`).
    Connect,
    /// Decoder is ready for data (`STMd`).
    DecoderReady,
    /// Stream connection established (`STMe`).
    StreamEstablished,
    /// Buffers flushed (`STMf`).
    Flushed,
    /// HTTP response headers received from the stream source (`STMh`).
    HeadersReceived,
    /// Input buffer reached the start threshold (`STMl`).
    BufferThreshold,
    /// Stream format not supported (`STMn`).
    NotSupported,
    /// Output buffer underrun (`STMo`).
    OutputUnderrun,
    /// Playback paused (`STMp`).
    Pause,
    /// Playback resumed (`STMr`).
    Resume,
    /// First audio of a track reached the output (`STMs`).
    TrackStarted,
    /// Periodic timer report (`STMt`).
    Timer,
    /// Input buffer underrun, playback stopped (`STMu`).
    Underrun,
}

impl StatusCode {
    /// The 4-byte ASCII event code for this status.
    #[must_use]
    pub const fn event_code(self) -> [u8; 4] {
        match self {
            Self::Connect => *b"STMc",
            Self::DecoderReady => *b"STMd",
            Self::StreamEstablished => *b"STMe",
            Self::Flushed => *b"STMf",
            Self::HeadersReceived => *b"STMh",
            Self::BufferThreshold => *b"STMl",
            Self::NotSupported => *b"STMn",
            Self::OutputUnderrun => *b"STMo",
            Self::Pause => *b"STMp",
            Self::Resume => *b"STMr",
            Self::TrackStarted => *b"STMs",
            Self::Timer => *b"STMt",
            Self::Underrun => *b"STMu",
        }
    }
}
