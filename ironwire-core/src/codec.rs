//! Big-endian primitives shared by the record and handshake codecs.
//!
//! Decoding never panics: every read is bounds-checked and a short buffer is
//! reported as [`Error::Framing`] naming the structure being read.

use crate::error::{Error, Result};
use bytes::BufMut;

/// Largest value a 24-bit ("triple byte") length can carry.
pub const MAX_U24: usize = 0x00FF_FFFF;

/// Bounds-checked cursor over a received byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    /// Start reading `buf` from the beginning.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The unconsumed tail, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        self.buf
    }

    /// Consume exactly `n` bytes.
    pub fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8]> {
        if self.buf.len() < n {
            return Err(Error::Framing(format!(
                "{}: need {} bytes, have {}",
                what,
                n,
                self.buf.len()
            )));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Read one byte.
    pub fn u8(&mut self, what: &str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    /// Read a big-endian u16.
    pub fn u16(&mut self, what: &str) -> Result<u16> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian 24-bit length.
    pub fn u24(&mut self, what: &str) -> Result<usize> {
        let b = self.take(3, what)?;
        Ok(((b[0] as usize) << 16) | ((b[1] as usize) << 8) | b[2] as usize)
    }

    /// Read a vector with a one-byte length prefix.
    pub fn vec_u8(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.u8(what)? as usize;
        self.take(len, what)
    }

    /// Read a vector with a two-byte length prefix.
    pub fn vec_u16(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.u16(what)? as usize;
        self.take(len, what)
    }

    /// Read a vector with a three-byte length prefix.
    pub fn vec_u24(&mut self, what: &str) -> Result<&'a [u8]> {
        let len = self.u24(what)?;
        self.take(len, what)
    }

    /// Fail unless the structure was consumed exactly.
    pub fn finish(&self, what: &str) -> Result<()> {
        if !self.buf.is_empty() {
            return Err(Error::Framing(format!(
                "{}: {} trailing bytes",
                what,
                self.buf.len()
            )));
        }
        Ok(())
    }
}

/// Write a 24-bit big-endian length.
pub fn put_u24<B: BufMut>(buf: &mut B, value: usize) -> Result<()> {
    if value > MAX_U24 {
        return Err(Error::Internal(format!("{} does not fit in 24 bits", value)));
    }
    buf.put_u8((value >> 16) as u8);
    buf.put_u8((value >> 8) as u8);
    buf.put_u8(value as u8);
    Ok(())
}

/// Write `data` behind a one-byte length prefix.
pub fn put_vec_u8<B: BufMut>(buf: &mut B, data: &[u8]) -> Result<()> {
    let len = u8::try_from(data.len())
        .map_err(|_| Error::Internal(format!("{} bytes exceed u8 length", data.len())))?;
    buf.put_u8(len);
    buf.put_slice(data);
    Ok(())
}

/// Write `data` behind a two-byte length prefix.
pub fn put_vec_u16<B: BufMut>(buf: &mut B, data: &[u8]) -> Result<()> {
    let len = u16::try_from(data.len())
        .map_err(|_| Error::Internal(format!("{} bytes exceed u16 length", data.len())))?;
    buf.put_u16(len);
    buf.put_slice(data);
    Ok(())
}

/// Write `data` behind a three-byte length prefix.
pub fn put_vec_u24<B: BufMut>(buf: &mut B, data: &[u8]) -> Result<()> {
    put_u24(buf, data.len())?;
    buf.put_slice(data);
    Ok(())
}
