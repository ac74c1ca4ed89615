//! Handshake message framing.
//!
//! A handshake message may span several records, and one record may carry
//! several messages back to back. [`HandshakeReassembler`] buffers record
//! payloads and yields complete messages in order.

use crate::codec::{put_u24, Reader};
use crate::error::{Error, Result};
use crate::protocol::HandshakeType;
use bytes::{Buf, Bytes, BytesMut};

/// Handshake header size: type (1) + length (3).
pub const HANDSHAKE_HEADER_SIZE: usize = 4;

/// Largest handshake body accepted from a peer.
pub const MAX_HANDSHAKE_SIZE: usize = 0x0004_0000;

/// Handshake message wrapper.
///
/// ```text
/// struct {
///     HandshakeType msg_type;    /* handshake type */
///     uint24 length;             /* bytes in message */
///     opaque body[length];
/// } Handshake;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeMessage {
    /// Message type
    pub msg_type: HandshakeType,

    /// Message body (without the 4-byte header)
    pub body: Bytes,
}

impl HandshakeMessage {
    /// Create a new handshake message.
    pub fn new(msg_type: HandshakeType, body: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            body: body.into(),
        }
    }

    /// Size of the message on the wire, header included.
    pub fn encoded_len(&self) -> usize {
        HANDSHAKE_HEADER_SIZE + self.body.len()
    }

    /// Encode header and body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        buf.push(self.msg_type.to_u8());
        put_u24(&mut buf, self.body.len())?;
        buf.extend_from_slice(&self.body);
        Ok(buf)
    }

    /// Decode exactly one message occupying all of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let msg_type = decode_type(reader.u8("handshake type")?)?;
        let body = reader.vec_u24("handshake body")?;
        reader.finish("handshake message")?;
        Ok(Self::new(msg_type, Bytes::copy_from_slice(body)))
    }
}

fn decode_type(raw: u8) -> Result<HandshakeType> {
    HandshakeType::from_u8(raw)
        .ok_or_else(|| Error::UnexpectedMessage(format!("Unknown handshake type {}", raw)))
}

/// Reassembles handshake messages from Handshake record payloads.
#[derive(Debug, Default)]
pub struct HandshakeReassembler {
    buffer: BytesMut,
}

impl HandshakeReassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record payload.
    pub fn push(&mut self, fragment: &[u8]) {
        self.buffer.extend_from_slice(fragment);
    }

    /// Pop the next complete message, if one is buffered.
    ///
    /// Oversized length prefixes are rejected as soon as the header is seen.
    pub fn next_message(&mut self) -> Result<Option<HandshakeMessage>> {
        if self.buffer.len() < HANDSHAKE_HEADER_SIZE {
            return Ok(None);
        }

        let length = ((self.buffer[1] as usize) << 16)
            | ((self.buffer[2] as usize) << 8)
            | self.buffer[3] as usize;
        if length > MAX_HANDSHAKE_SIZE {
            return Err(Error::Framing(format!(
                "Handshake message of {} bytes exceeds limit",
                length
            )));
        }
        if self.buffer.len() < HANDSHAKE_HEADER_SIZE + length {
            return Ok(None);
        }

        let msg_type = decode_type(self.buffer[0])?;
        self.buffer.advance(HANDSHAKE_HEADER_SIZE);
        let body = self.buffer.split_to(length).freeze();
        Ok(Some(HandshakeMessage { msg_type, body }))
    }

    /// Whether a partial message is still buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_envelope() {
        let msg = HandshakeMessage::new(HandshakeType::ServerHelloDone, Bytes::new());
        assert_eq!(msg.encode().unwrap(), [0x0e, 0, 0, 0]);

        let msg = HandshakeMessage::new(HandshakeType::Finished, vec![7u8; 12]);
        let encoded = msg.encode().unwrap();
        assert_eq!(&encoded[..4], &[0x14, 0, 0, 12]);
        assert_eq!(msg.encoded_len(), 16);
        assert_eq!(HandshakeMessage::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn test_multiple_messages_in_one_record() {
        let a = HandshakeMessage::new(HandshakeType::ServerHello, vec![1u8, 2, 3]);
        let b = HandshakeMessage::new(HandshakeType::ServerHelloDone, Bytes::new());
        let mut record = a.encode().unwrap();
        record.extend_from_slice(&b.encode().unwrap());

        let mut reassembler = HandshakeReassembler::new();
        reassembler.push(&record);
        assert_eq!(reassembler.next_message().unwrap(), Some(a));
        assert_eq!(reassembler.next_message().unwrap(), Some(b));
        assert_eq!(reassembler.next_message().unwrap(), None);
        assert!(reassembler.is_empty());
    }

    #[test]
    fn test_message_split_across_records() {
        let msg = HandshakeMessage::new(HandshakeType::Certificate, vec![9u8; 40]);
        let encoded = msg.encode().unwrap();

        let mut reassembler = HandshakeReassembler::new();
        reassembler.push(&encoded[..2]);
        assert_eq!(reassembler.next_message().unwrap(), None);
        reassembler.push(&encoded[2..30]);
        assert_eq!(reassembler.next_message().unwrap(), None);
        reassembler.push(&encoded[30..]);
        assert_eq!(reassembler.next_message().unwrap(), Some(msg));
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut reassembler = HandshakeReassembler::new();
        reassembler.push(&[0x0b, 0xff, 0xff, 0xff]);
        assert!(reassembler.next_message().unwrap_err().is_framing());
    }

    #[test]
    fn test_truncated_triple_byte_length() {
        assert!(HandshakeMessage::decode(&[0x02, 0x00, 0x00]).is_err());
        assert!(HandshakeMessage::decode(&[0x02, 0x00, 0x00, 0x05, 1, 2]).is_err());
    }
}
