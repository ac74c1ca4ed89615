//! ClientKeyExchange (RFC 5246 Section 7.4.7, RFC 4492 Section 5.7).
//!
//! The body has no self-describing tag; the negotiated suite tells the
//! receiver which form to expect.

use super::server_key_exchange::EcPoint;
use crate::codec::{put_vec_u16, Reader};
use crate::error::Result;
use ironwire_crypto::KeyExchangeAlgorithm;

/// ClientKeyExchange message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientKeyExchange {
    /// `EncryptedPreMasterSecret` with a two-byte length prefix
    Rsa(Vec<u8>),
    /// Client's ephemeral ECDH public point
    Ecdhe(EcPoint),
}

impl ClientKeyExchange {
    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        match self {
            ClientKeyExchange::Rsa(ciphertext) => put_vec_u16(&mut buf, ciphertext)?,
            ClientKeyExchange::Ecdhe(point) => point.encode(&mut buf)?,
        }
        Ok(buf)
    }

    /// Decode an RSA-encrypted pre-master secret.
    pub fn decode_rsa(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let ciphertext = reader.vec_u16("encrypted pre-master secret")?.to_vec();
        reader.finish("ClientKeyExchange")?;
        Ok(ClientKeyExchange::Rsa(ciphertext))
    }

    /// Decode an ECDH public point on `curve`.
    pub fn decode_ecdhe(data: &[u8], curve: KeyExchangeAlgorithm) -> Result<Self> {
        let mut reader = Reader::new(data);
        let point = EcPoint::decode(&mut reader, curve)?;
        reader.finish("ClientKeyExchange")?;
        Ok(ClientKeyExchange::Ecdhe(point))
    }
}
