//! Playback status tracking and `STAT` message production.

use slimwire_proto::{ClientMessage, StatusCode, StatusSnapshot};

use crate::clock::{Clock, SystemClock};

/// Mutable playback counters plus the uptime clock behind `STAT` reports.
///
/// The tracker owns its [`StatusSnapshot`]; the audio pipeline updates the
/// counters through the setters as playback progresses, and the protocol
/// loop calls [`status_message`](Self::status_message) whenever an event (or
/// a server `strm t` request) needs reporting. `jiffies_ms` is refreshed
/// from the injected clock on every report and cannot be set by callers.
///
/// Single-owner: wrap in external synchronization for cross-thread mutation.
pub struct StatusTracker<C: Clock = SystemClock> {
    clock: C,
    started: C::Instant,
    snapshot: StatusSnapshot,
}

impl StatusTracker<SystemClock> {
    /// Create a tracker on the system clock, uptime starting now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for StatusTracker<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> StatusTracker<C> {
    /// Create a tracker on an injected clock, uptime starting now.
    pub fn with_clock(clock: C) -> Self {
        let started = clock.now();
        Self { clock, started, snapshot: StatusSnapshot::default() }
    }

    /// Current counter values.
    #[must_use]
    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Player uptime in milliseconds, wrapping at 2^32.
    #[must_use]
    pub fn jiffies_ms(&self) -> u32 {
        let elapsed = self.clock.now() - self.started;
        elapsed.as_millis() as u32
    }

    /// Add to the CR/LF counter, wrapping at 256.
    pub fn add_crlf(&mut self, count: u8) {
        self.snapshot.crlf = self.snapshot.crlf.wrapping_add(count);
    }

    /// Add to the received-bytes counter, wrapping at 2^64.
    pub fn add_bytes_received(&mut self, count: u64) {
        self.snapshot.bytes_received = self.snapshot.bytes_received.wrapping_add(count);
    }

    /// Set the CR/LF counter.
    pub fn set_crlf(&mut self, crlf: u8) {
        self.snapshot.crlf = crlf;
    }

    /// Set the input buffer size in bytes.
    pub fn set_buffer_size(&mut self, bytes: u32) {
        self.snapshot.buffer_size = bytes;
    }

    /// Set the input buffer fill level in bytes.
    pub fn set_fullness(&mut self, bytes: u32) {
        self.snapshot.fullness = bytes;
    }

    /// Set the received-bytes counter.
    pub fn set_bytes_received(&mut self, bytes: u64) {
        self.snapshot.bytes_received = bytes;
    }

    /// Set the wireless signal strength.
    pub fn set_signal_strength(&mut self, strength: u16) {
        self.snapshot.signal_strength = strength;
    }

    /// Set the output buffer size in bytes.
    pub fn set_output_buffer_size(&mut self, bytes: u32) {
        self.snapshot.output_buffer_size = bytes;
    }

    /// Set the output buffer fill level in bytes.
    pub fn set_output_buffer_fullness(&mut self, bytes: u32) {
        self.snapshot.output_buffer_fullness = bytes;
    }

    /// Set the seconds of the current track played so far.
    pub fn set_elapsed_seconds(&mut self, seconds: u32) {
        self.snapshot.elapsed_seconds = seconds;
    }

    /// Set the milliseconds of the current track played so far.
    pub fn set_elapsed_ms(&mut self, ms: u32) {
        self.snapshot.elapsed_ms = ms;
    }

    /// Set the supply voltage.
    pub fn set_voltage(&mut self, voltage: u16) {
        self.snapshot.voltage = voltage;
    }

    /// Set the server-timestamp echo for the report being answered.
    pub fn set_timestamp_ms(&mut self, ms: u32) {
        self.snapshot.timestamp_ms = ms;
    }

    /// Set the last error code.
    pub fn set_error_code(&mut self, code: u16) {
        self.snapshot.error_code = code;
    }

    /// Build the `STAT` message for `code` with current counters.
    ///
    /// Refreshes `jiffies_ms` from the clock before snapshotting.
    pub fn status_message(&mut self, code: StatusCode) -> ClientMessage {
        self.snapshot.jiffies_ms = self.jiffies_ms();
        ClientMessage::Stat { event_code: code.event_code(), status: self.snapshot }
    }
}
