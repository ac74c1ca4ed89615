//! ClientHello (RFC 5246 Section 7.4.1.2).
//!
//! ```text
//! struct {
//!     ProtocolVersion client_version;
//!     Random random;
//!     SessionID session_id;
//!     CipherSuite cipher_suites<2..2^16-2>;
//!     CompressionMethod compression_methods<1..2^8-1>;
//!     Extension extensions<0..2^16-1>;
//! } ClientHello;
//! ```

use super::HelloHeader;
use crate::codec::{put_vec_u16, put_vec_u8, Reader};
use crate::error::{Error, Result};
use crate::extensions::Extensions;
use bytes::BufMut;

/// The null compression method, the only one ever offered.
pub const COMPRESSION_NULL: u8 = 0;

/// ClientHello message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello {
    /// Version, random and session id
    pub header: HelloHeader,
    /// Offered cipher suite codes, most preferred first
    pub cipher_suites: Vec<u16>,
    /// Offered compression methods
    pub compression_methods: Vec<u8>,
    /// Extensions
    pub extensions: Extensions,
}

impl ClientHello {
    /// Create a ClientHello offering only null compression.
    pub fn new(header: HelloHeader, cipher_suites: Vec<u16>, extensions: Extensions) -> Self {
        Self {
            header,
            cipher_suites,
            compression_methods: vec![COMPRESSION_NULL],
            extensions,
        }
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.header.encode(&mut buf)?;

        let mut suites = Vec::with_capacity(self.cipher_suites.len() * 2);
        for suite in &self.cipher_suites {
            suites.put_u16(*suite);
        }
        put_vec_u16(&mut buf, &suites)?;
        put_vec_u8(&mut buf, &self.compression_methods)?;
        self.extensions.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let header = HelloHeader::decode(&mut reader)?;

        let suites = reader.vec_u16("cipher suites")?;
        if suites.is_empty() || suites.len() % 2 != 0 {
            return Err(Error::Framing(format!(
                "Invalid cipher suite list length {}",
                suites.len()
            )));
        }
        let cipher_suites = suites
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();

        let compression_methods = reader.vec_u8("compression methods")?.to_vec();
        if compression_methods.is_empty() {
            return Err(Error::Framing("Empty compression method list".into()));
        }

        let extensions = Extensions::decode(&mut reader)?;
        reader.finish("ClientHello")?;

        Ok(Self {
            header,
            cipher_suites,
            compression_methods,
            extensions,
        })
    }

    /// Whether the peer can do without compression.
    pub fn offers_null_compression(&self) -> bool {
        self.compression_methods.contains(&COMPRESSION_NULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::server_name_extension;

    fn header() -> HelloHeader {
        HelloHeader {
            version: 0x0303,
            random: [0xaa; 32],
            session_id: vec![0; 32],
        }
    }

    #[test]
    fn test_client_hello_body() {
        let mut exts = Extensions::new();
        exts.push(server_name_extension("example.com").unwrap());
        let hello = ClientHello::new(header(), vec![0xc02f, 0x009c], exts);

        let body = hello.encode().unwrap();
        // header (67) then suites length 4
        assert_eq!(&body[67..73], &[0x00, 0x04, 0xc0, 0x2f, 0x00, 0x9c]);
        assert_eq!(&body[73..75], &[0x01, 0x00]);

        let decoded = ClientHello::decode(&body).unwrap();
        assert_eq!(decoded, hello);
        assert!(decoded.offers_null_compression());
        assert_eq!(
            decoded.extensions.server_name().unwrap().as_deref(),
            Some("example.com")
        );
    }

    #[test]
    fn test_hello_without_extensions() {
        let hello = ClientHello::new(header(), vec![0x002f], Extensions::new());
        let body = hello.encode().unwrap();
        assert_eq!(body.len(), 67 + 4 + 2);
        assert!(ClientHello::decode(&body).unwrap().extensions.is_empty());
    }

    #[test]
    fn test_odd_suite_list_rejected() {
        let mut body = Vec::new();
        header().encode(&mut body).unwrap();
        body.extend_from_slice(&[0x00, 0x03, 0xc0, 0x2f, 0x00, 0x01, 0x00]);
        assert!(ClientHello::decode(&body).unwrap_err().is_framing());
    }
}
