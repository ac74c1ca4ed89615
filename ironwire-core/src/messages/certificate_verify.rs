//! CertificateVerify (RFC 5246 Section 7.4.8).

use crate::codec::{put_vec_u16, Reader};
use crate::error::{Error, Result};
use bytes::BufMut;
use ironwire_crypto::SignatureAlgorithm;

/// Client's proof of possession of its certificate key.
///
/// ```text
/// digitally-signed struct {
///     opaque handshake_messages[handshake_messages_length];
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateVerify {
    /// Signature algorithm
    pub algorithm: SignatureAlgorithm,
    /// Signature over every handshake message before this one
    pub signature: Vec<u8>,
}

impl CertificateVerify {
    /// Create a new CertificateVerify.
    pub fn new(algorithm: SignatureAlgorithm, signature: Vec<u8>) -> Self {
        Self {
            algorithm,
            signature,
        }
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(4 + self.signature.len());
        buf.put_u16(self.algorithm.to_u16());
        put_vec_u16(&mut buf, &self.signature)?;
        Ok(buf)
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let code = reader.u16("signature algorithm")?;
        let algorithm = SignatureAlgorithm::from_u16(code).ok_or_else(|| {
            Error::Negotiation(format!("Unknown signature algorithm 0x{:04x}", code))
        })?;
        let signature = reader.vec_u16("signature")?.to_vec();
        reader.finish("CertificateVerify")?;
        Ok(Self {
            algorithm,
            signature,
        })
    }
}
