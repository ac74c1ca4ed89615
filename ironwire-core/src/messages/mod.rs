//! TLS 1.2 handshake message bodies.
//!
//! Each type encodes to and decodes from the body carried inside a
//! [`HandshakeMessage`](crate::handshake_io::HandshakeMessage) envelope.

pub mod certificate;
pub mod certificate_request;
pub mod certificate_verify;
pub mod client_hello;
pub mod client_key_exchange;
pub mod finished;
pub mod server_hello;
pub mod server_key_exchange;

pub use certificate::Certificate;
pub use certificate_request::{CertificateInfo, ClientCertificateType};
pub use certificate_verify::CertificateVerify;
pub use client_hello::ClientHello;
pub use client_key_exchange::ClientKeyExchange;
pub use finished::Finished;
pub use server_hello::ServerHello;
pub use server_key_exchange::{EcParameters, EcPoint, ServerKeyExchange, NAMED_CURVE_TYPE};

use crate::codec::{put_vec_u8, Reader};
use crate::error::{Error, Result};
use crate::protocol::{RANDOM_SIZE, SESSION_ID_SIZE};
use bytes::BufMut;
use ironwire_crypto::CryptoProvider;
use std::time::{SystemTime, UNIX_EPOCH};

/// Fields shared by ClientHello and ServerHello.
///
/// ```text
/// ProtocolVersion version;
/// Random random;            /* 32 bytes */
/// SessionID session_id<0..32>;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloHeader {
    /// Offered (client) or selected (server) version, kept raw so that
    /// unknown versions can be reported
    pub version: u16,
    /// Hello random
    pub random: [u8; RANDOM_SIZE],
    /// Session id
    pub session_id: Vec<u8>,
}

impl HelloHeader {
    /// Header with a fresh random and the fixed all-zero session id.
    pub fn generate(provider: &dyn CryptoProvider, version: u16) -> Result<Self> {
        Ok(Self {
            version,
            random: generate_random(provider)?,
            session_id: vec![0u8; SESSION_ID_SIZE],
        })
    }

    /// Encode the header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        buf.put_u16(self.version);
        buf.put_slice(&self.random);
        put_vec_u8(buf, &self.session_id)
    }

    /// Decode the header.
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let version = reader.u16("hello version")?;
        let mut random = [0u8; RANDOM_SIZE];
        random.copy_from_slice(reader.take(RANDOM_SIZE, "hello random")?);
        let session_id = reader.vec_u8("session id")?;
        if session_id.len() > SESSION_ID_SIZE {
            return Err(Error::Framing(format!(
                "Session id of {} bytes exceeds {}",
                session_id.len(),
                SESSION_ID_SIZE
            )));
        }
        Ok(Self {
            version,
            random,
            session_id: session_id.to_vec(),
        })
    }
}

/// Hello random: 4-byte big-endian unix time followed by 28 random bytes.
pub fn generate_random(provider: &dyn CryptoProvider) -> Result<[u8; RANDOM_SIZE]> {
    let mut random = [0u8; RANDOM_SIZE];
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0);
    random[..4].copy_from_slice(&now.to_be_bytes());
    provider.random().fill(&mut random[4..])?;
    Ok(random)
}

/// Fail unless a body that must be empty (ServerHelloDone) is.
pub fn expect_empty(body: &[u8], what: &str) -> Result<()> {
    if !body.is_empty() {
        return Err(Error::Framing(format!(
            "{} must be empty, got {} bytes",
            what,
            body.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_hello_header_layout() {
        let provider = RustCryptoProvider::new();
        let header = HelloHeader::generate(&provider, 0x0303).unwrap();
        assert_eq!(header.session_id, vec![0u8; 32]);

        let mut buf = Vec::new();
        header.encode(&mut buf).unwrap();
        assert_eq!(buf.len(), 2 + 32 + 1 + 32);
        assert_eq!(&buf[..2], &[3, 3]);
        assert_eq!(buf[34], 32);

        let decoded = HelloHeader::decode(&mut Reader::new(&buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_random_starts_with_time() {
        let provider = RustCryptoProvider::new();
        let random = generate_random(&provider).unwrap();
        let stamp = u32::from_be_bytes([random[0], random[1], random[2], random[3]]);
        // after 2020-01-01
        assert!(stamp > 1_577_836_800);
    }

    #[test]
    fn test_session_id_over_32_rejected() {
        let mut buf = vec![3, 3];
        buf.extend_from_slice(&[0u8; 32]);
        buf.push(33);
        buf.extend_from_slice(&[0u8; 33]);
        assert!(HelloHeader::decode(&mut Reader::new(&buf)).is_err());
    }
}
