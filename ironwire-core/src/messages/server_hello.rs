//! ServerHello (RFC 5246 Section 7.4.1.3).

use super::client_hello::COMPRESSION_NULL;
use super::HelloHeader;
use crate::codec::Reader;
use crate::error::Result;
use crate::extensions::Extensions;
use bytes::BufMut;

/// ServerHello message.
///
/// ```text
/// struct {
///     ProtocolVersion server_version;
///     Random random;
///     SessionID session_id;
///     CipherSuite cipher_suite;
///     CompressionMethod compression_method;
///     Extension extensions<0..2^16-1>;
/// } ServerHello;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHello {
    /// Version, random and session id
    pub header: HelloHeader,
    /// Selected cipher suite code
    pub cipher_suite: u16,
    /// Selected compression method
    pub compression_method: u8,
    /// Extensions
    pub extensions: Extensions,
}

impl ServerHello {
    /// Create a ServerHello selecting null compression.
    pub fn new(header: HelloHeader, cipher_suite: u16, extensions: Extensions) -> Self {
        Self {
            header,
            cipher_suite,
            compression_method: COMPRESSION_NULL,
            extensions,
        }
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.header.encode(&mut buf)?;
        buf.put_u16(self.cipher_suite);
        buf.put_u8(self.compression_method);
        self.extensions.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let header = HelloHeader::decode(&mut reader)?;
        let cipher_suite = reader.u16("cipher suite")?;
        let compression_method = reader.u8("compression method")?;
        let extensions = Extensions::decode(&mut reader)?;
        reader.finish("ServerHello")?;

        Ok(Self {
            header,
            cipher_suite,
            compression_method,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::ec_point_formats_extension;

    #[test]
    fn test_server_hello_body() {
        let mut exts = Extensions::new();
        exts.push(ec_point_formats_extension().unwrap());
        let hello = ServerHello::new(
            HelloHeader {
                version: 0x0303,
                random: [7; 32],
                session_id: vec![0; 32],
            },
            0xc030,
            exts,
        );
        let body = hello.encode().unwrap();
        assert_eq!(&body[67..70], &[0xc0, 0x30, 0x00]);
        assert_eq!(ServerHello::decode(&body).unwrap(), hello);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let hello = ServerHello::new(
            HelloHeader {
                version: 0x0303,
                random: [7; 32],
                session_id: Vec::new(),
            },
            0x009c,
            Extensions::new(),
        );
        let mut body = hello.encode().unwrap();
        assert_eq!(ServerHello::decode(&body).unwrap(), hello);
        body.push(0);
        assert!(ServerHello::decode(&body).is_err());
    }
}
