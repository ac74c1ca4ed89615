//! TLS record framing.
//!
//! # Record Structure
//!
//! ```text
//! struct {
//!     ContentType type;
//!     ProtocolVersion version;
//!     uint16 length;
//!     opaque fragment[length];
//! } TLSRecord;
//! ```
//!
//! The header is decoded on its own so a reader can reject an oversized
//! length before buffering any of the payload.

use crate::error::{Error, Result};
use crate::protocol::{ContentType, ProtocolVersion};
use bytes::Bytes;

/// Maximum record payload accepted on the wire (plaintext or ciphertext).
pub const MAX_RECORD_PAYLOAD: usize = 0x4800;

/// Maximum plaintext fragment produced when sending.
pub const MAX_FRAGMENT_SIZE: usize = 16384;

/// TLS record header size (5 bytes).
pub const RECORD_HEADER_SIZE: usize = 5;

/// Decoded record header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Content type
    pub content_type: ContentType,

    /// Record version
    pub version: ProtocolVersion,

    /// Payload length that follows the header
    pub length: usize,
}

impl RecordHeader {
    /// Decode and validate a 5-byte header.
    ///
    /// Fails with [`Error::RecordOverflow`] when the announced length exceeds
    /// [`MAX_RECORD_PAYLOAD`].
    pub fn decode(header: &[u8; RECORD_HEADER_SIZE]) -> Result<Self> {
        let content_type = ContentType::from_u8(header[0])
            .ok_or_else(|| Error::Framing(format!("Invalid content type {}", header[0])))?;

        let version_raw = u16::from_be_bytes([header[1], header[2]]);
        let version = ProtocolVersion::from_u16(version_raw).ok_or_else(|| {
            Error::Framing(format!("Invalid record version 0x{:04x}", version_raw))
        })?;

        let length = u16::from_be_bytes([header[3], header[4]]) as usize;
        if length > MAX_RECORD_PAYLOAD {
            return Err(Error::RecordOverflow(length));
        }

        Ok(Self {
            content_type,
            version,
            length,
        })
    }

    /// Encode the header.
    pub fn encode(&self) -> [u8; RECORD_HEADER_SIZE] {
        let version = self.version.to_u16().to_be_bytes();
        let length = (self.length as u16).to_be_bytes();
        [
            self.content_type.to_u8(),
            version[0],
            version[1],
            length[0],
            length[1],
        ]
    }
}

/// One wire-level record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsRecord {
    /// Content type
    pub content_type: ContentType,

    /// Record version
    pub version: ProtocolVersion,

    /// Payload (ciphertext once a cipher is active)
    pub payload: Bytes,
}

impl TlsRecord {
    /// Create a new record.
    pub fn new(content_type: ContentType, version: ProtocolVersion, payload: impl Into<Bytes>) -> Self {
        Self {
            content_type,
            version,
            payload: payload.into(),
        }
    }

    /// Header describing this record.
    pub fn header(&self) -> Result<RecordHeader> {
        if self.payload.len() > MAX_RECORD_PAYLOAD {
            return Err(Error::RecordOverflow(self.payload.len()));
        }
        Ok(RecordHeader {
            content_type: self.content_type,
            version: self.version,
            length: self.payload.len(),
        })
    }

    /// Encode header and payload.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let header = self.header()?;
        let mut buf = Vec::with_capacity(RECORD_HEADER_SIZE + self.payload.len());
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Decode one complete record from the front of `data`.
    ///
    /// Returns the record and the number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::Framing("Record header truncated".into()));
        }
        let mut raw = [0u8; RECORD_HEADER_SIZE];
        raw.copy_from_slice(&data[..RECORD_HEADER_SIZE]);
        let header = RecordHeader::decode(&raw)?;

        let end = RECORD_HEADER_SIZE + header.length;
        if data.len() < end {
            return Err(Error::Framing("Record payload truncated".into()));
        }

        let record = Self::new(
            header.content_type,
            header.version,
            Bytes::copy_from_slice(&data[RECORD_HEADER_SIZE..end]),
        );
        Ok((record, end))
    }
}
