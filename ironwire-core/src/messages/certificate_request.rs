//! CertificateRequest (RFC 5246 Section 7.4.4).
//!
//! ```text
//! struct {
//!     ClientCertificateType certificate_types<1..2^8-1>;
//!     SignatureAndHashAlgorithm supported_signature_algorithms<2^16-1>;
//!     DistinguishedName certificate_authorities<0..2^16-1>;
//! } CertificateRequest;
//! ```

use crate::codec::{put_vec_u16, put_vec_u8, Reader};
use crate::error::{Error, Result};
use bytes::BufMut;
use ironwire_crypto::{KeyKind, SignatureAlgorithm};

/// Client certificate types we understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientCertificateType {
    /// rsa_sign
    RsaSign = 1,
    /// ecdsa_sign
    EcdsaSign = 64,
}

impl ClientCertificateType {
    /// Certificate type for a key kind.
    pub const fn for_key(kind: KeyKind) -> Self {
        match kind {
            KeyKind::Rsa => ClientCertificateType::RsaSign,
            KeyKind::Ec => ClientCertificateType::EcdsaSign,
        }
    }
}

/// The server's constraints on an acceptable client certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Raw accepted certificate types
    pub certificate_types: Vec<u8>,
    /// Accepted (hash, signature) pairs we understand
    pub signature_algorithms: Vec<SignatureAlgorithm>,
    /// Accepted issuer distinguished names (DER)
    pub authorities: Vec<Vec<u8>>,
}

impl CertificateInfo {
    /// Create a request.
    pub fn new(
        certificate_types: Vec<ClientCertificateType>,
        signature_algorithms: Vec<SignatureAlgorithm>,
        authorities: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            certificate_types: certificate_types.into_iter().map(|t| t as u8).collect(),
            signature_algorithms,
            authorities,
        }
    }

    /// Whether a key of `kind` is acceptable.
    pub fn accepts_key(&self, kind: KeyKind) -> bool {
        self.certificate_types
            .contains(&(ClientCertificateType::for_key(kind) as u8))
    }

    /// Whether a certificate issued by `issuer` is acceptable.
    ///
    /// An empty authority list accepts any issuer.
    pub fn accepts_issuer(&self, issuer: &[u8]) -> bool {
        self.authorities.is_empty() || self.authorities.iter().any(|dn| dn == issuer)
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        put_vec_u8(&mut buf, &self.certificate_types)?;

        let mut algs = Vec::with_capacity(self.signature_algorithms.len() * 2);
        for alg in &self.signature_algorithms {
            algs.put_u16(alg.to_u16());
        }
        put_vec_u16(&mut buf, &algs)?;

        let mut dns = Vec::new();
        for dn in &self.authorities {
            put_vec_u16(&mut dns, dn)?;
        }
        put_vec_u16(&mut buf, &dns)?;
        Ok(buf)
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let certificate_types = reader.vec_u8("certificate types")?.to_vec();
        if certificate_types.is_empty() {
            return Err(Error::Framing("Empty certificate type list".into()));
        }

        let algs = reader.vec_u16("signature algorithms")?;
        if algs.len() % 2 != 0 {
            return Err(Error::Framing("Odd signature algorithm list".into()));
        }
        let signature_algorithms = algs
            .chunks_exact(2)
            .filter_map(|p| SignatureAlgorithm::from_u16(u16::from_be_bytes([p[0], p[1]])))
            .collect();

        let mut dns = Reader::new(reader.vec_u16("certificate authorities")?);
        let mut authorities = Vec::new();
        while !dns.is_empty() {
            authorities.push(dns.vec_u16("distinguished name")?.to_vec());
        }
        reader.finish("CertificateRequest")?;

        Ok(Self {
            certificate_types,
            signature_algorithms,
            authorities,
        })
    }
}
