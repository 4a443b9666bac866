//! Wire primitives: checked big-endian reads over a byte cursor.
//!
//! SlimProto interleaves fixed-width big-endian integers with 4-byte ASCII
//! opcodes. All multi-byte integers on the wire are network byte order;
//! opcodes are compared by value, case-sensitively.
//!
//! Writes go through [`bytes::BufMut`] directly (`put_u16`, `put_u32`, … are
//! big-endian); only the read side needs a helper because slicing untrusted
//! input must be bounds-checked.

use crate::errors::{ProtocolError, Result};

/// Checked read cursor over a byte slice.
///
/// A failed read leaves the position untouched, so the reported
/// `needed`/`available` pair always describes the read that could not be
/// satisfied.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `buf`.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Consume and return the next `n` bytes.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than `n` bytes remain.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let slice = self
            .buf
            .get(self.pos..self.pos + n)
            .ok_or(ProtocolError::Truncated { needed: n, available: self.remaining() })?;
        self.pos += n;
        Ok(slice)
    }

    /// Consume and return all remaining bytes (possibly empty).
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = self.buf.get(self.pos..).unwrap_or_default();
        self.pos = self.buf.len();
        slice
    }

    /// Consume a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Consume one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Consume a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    /// Consume a big-endian `u32`.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Consume a big-endian `u64`.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }
}
