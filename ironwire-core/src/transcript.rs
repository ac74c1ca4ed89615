//! Handshake transcript for TLS 1.2.
//!
//! The transcript accumulates the encoded bytes (4-byte header included) of
//! every handshake message sent or received, in wire order. HelloRequest is
//! never recorded. Both Finished messages are recorded as well, because the
//! second Finished covers the first one.
//!
//! Hashing takes an explicit `trim` so a party checking a message it has just
//! recorded (a peer's Finished or CertificateVerify) hashes exactly the bytes
//! that preceded it:
//!
//! ```rust,ignore
//! transcript.record(&finished)?;
//! let hash = transcript.hash(provider, suite.prf_hash(), finished.encoded_len())?;
//! ```
//!
//! The transcript is owned by the handshake state machine, so `&mut self`
//! serialises updates against reads.

use crate::error::{Error, Result};
use crate::handshake_io::HandshakeMessage;
use crate::protocol::HandshakeType;
use ironwire_crypto::{CryptoProvider, HashAlgorithm};

/// Running handshake transcript.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    bytes: Vec<u8>,
    messages: usize,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one already encoded handshake message.
    pub fn update(&mut self, encoded: &[u8]) {
        self.bytes.extend_from_slice(encoded);
        self.messages += 1;
    }

    /// Append a handshake message. HelloRequest is ignored.
    pub fn record(&mut self, message: &HandshakeMessage) -> Result<()> {
        if message.msg_type == HandshakeType::HelloRequest {
            return Ok(());
        }
        let encoded = message.encode()?;
        self.update(&encoded);
        Ok(())
    }

    /// Hash everything recorded except the last `trim` bytes.
    pub fn hash(
        &self,
        provider: &dyn CryptoProvider,
        algorithm: HashAlgorithm,
        trim: usize,
    ) -> Result<Vec<u8>> {
        Ok(provider.digest(algorithm, self.prefix(trim)?)?)
    }

    /// Recorded bytes without the last `trim` bytes.
    pub fn prefix(&self, trim: usize) -> Result<&[u8]> {
        let end = self.bytes.len().checked_sub(trim).ok_or_else(|| {
            Error::Internal(format!(
                "Cannot trim {} bytes from a {}-byte transcript",
                trim,
                self.bytes.len()
            ))
        })?;
        Ok(&self.bytes[..end])
    }

    /// The raw recorded bytes. CertificateVerify signs these directly.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total bytes recorded.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of messages recorded.
    pub fn message_count(&self) -> usize {
        self.messages
    }
}
