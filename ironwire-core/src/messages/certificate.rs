//! Certificate message (RFC 5246 Section 7.4.2).
//!
//! ```text
//! opaque ASN.1Cert<1..2^24-1>;
//!
//! struct {
//!     ASN.1Cert certificate_list<0..2^24-1>;
//! } Certificate;
//! ```

use crate::codec::{put_vec_u24, Reader};
use crate::error::{Error, Result};

/// Certificate chain, leaf first. An empty chain is legal from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Certificate {
    /// DER-encoded certificates
    pub chain: Vec<Vec<u8>>,
}

impl Certificate {
    /// Create a new Certificate message.
    pub fn new(chain: Vec<Vec<u8>>) -> Self {
        Self { chain }
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut list = Vec::new();
        for cert in &self.chain {
            put_vec_u24(&mut list, cert)?;
        }
        let mut buf = Vec::with_capacity(list.len() + 3);
        put_vec_u24(&mut buf, &list)?;
        Ok(buf)
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let mut list = Reader::new(reader.vec_u24("certificate list")?);
        reader.finish("Certificate")?;

        let mut chain = Vec::new();
        while !list.is_empty() {
            let cert = list.vec_u24("certificate")?;
            if cert.is_empty() {
                return Err(Error::Framing("Zero-length certificate".into()));
            }
            chain.push(cert.to_vec());
        }
        Ok(Self { chain })
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_triple_byte_lengths() {
        let msg = Certificate::new(vec![vec![1, 2, 3], vec![4]]);
        let body = msg.encode().unwrap();
        assert_eq!(body, [0, 0, 10, 0, 0, 3, 1, 2, 3, 0, 0, 1, 4]);
        assert_eq!(Certificate::decode(&body).unwrap(), msg);
    }

    #[test]
    fn test_empty_chain() {
        let body = Certificate::default().encode().unwrap();
        assert_eq!(body, [0, 0, 0]);
        assert!(Certificate::decode(&body).unwrap().is_empty());
    }

    #[test]
    fn test_inner_length_overrun() {
        // outer says 4 bytes, inner claims 5
        assert!(Certificate::decode(&[0, 0, 4, 0, 0, 5, 1]).is_err());
        assert!(Certificate::decode(&[0, 0, 4, 0, 0, 5, 1, 2, 3, 4, 5]).is_err());
    }
}
