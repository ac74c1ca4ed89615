//! X.509 certificate inspection.
//!
//! Certificates are parsed with `x509-parser` once and the fields the
//! handshake needs are copied out, so the result owns its data and can be
//! kept for the lifetime of a connection.

use crate::error::{Result, VerificationError};
use ironwire_crypto::{CryptoProvider, KeyKind, SignatureAlgorithm};
use std::net::IpAddr;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::{FromDer, X509Certificate};

const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";

/// Subject public key in the encoding the crypto provider expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyInfo {
    /// Key family
    pub kind: KeyKind,
    /// PKCS#1 `RSAPublicKey` DER for RSA, SEC1 point for EC
    pub bytes: Vec<u8>,
}

/// A parsed peer certificate.
#[derive(Debug, Clone)]
pub struct PeerCertificate {
    der: Vec<u8>,
    subject: Vec<u8>,
    issuer: Vec<u8>,
    not_before: i64,
    not_after: i64,
    dns_names: Vec<String>,
    ip_addresses: Vec<IpAddr>,
    is_ca: bool,
    public_key: PublicKeyInfo,
    tbs: Vec<u8>,
    signature_algorithm: Option<SignatureAlgorithm>,
    signature_oid: String,
    signature: Vec<u8>,
}

impl PeerCertificate {
    /// Parse a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, cert) = X509Certificate::from_der(der)
            .map_err(|e| VerificationError::MalformedCertificate(e.to_string()))?;
        if !rest.is_empty() {
            return Err(VerificationError::MalformedCertificate(format!(
                "{} trailing bytes after certificate",
                rest.len()
            ))
            .into());
        }

        let spki = cert.public_key();
        let key_oid = spki.algorithm.algorithm.to_id_string();
        let kind = match key_oid.as_str() {
            OID_RSA_ENCRYPTION => KeyKind::Rsa,
            OID_EC_PUBLIC_KEY => KeyKind::Ec,
            other => {
                return Err(VerificationError::UnsupportedCertificate(format!(
                    "public key algorithm {}",
                    other
                ))
                .into())
            },
        };
        let public_key = PublicKeyInfo {
            kind,
            bytes: spki.subject_public_key.data.to_vec(),
        };

        let mut dns_names = Vec::new();
        let mut ip_addresses = Vec::new();
        let san = cert
            .subject_alternative_name()
            .map_err(|e| VerificationError::MalformedCertificate(e.to_string()))?;
        if let Some(san) = san {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                    GeneralName::IPAddress(raw) => {
                        if let Some(ip) = ip_from_bytes(raw) {
                            ip_addresses.push(ip);
                        }
                    },
                    _ => {},
                }
            }
        }

        let is_ca = cert
            .basic_constraints()
            .ok()
            .flatten()
            .map(|bc| bc.value.ca)
            .unwrap_or(false);
        let signature_oid = cert.signature_algorithm.algorithm.to_id_string();

        Ok(Self {
            der: der.to_vec(),
            subject: cert.subject().as_raw().to_vec(),
            issuer: cert.issuer().as_raw().to_vec(),
            not_before: cert.validity().not_before.timestamp(),
            not_after: cert.validity().not_after.timestamp(),
            dns_names,
            ip_addresses,
            is_ca,
            public_key,
            tbs: cert.tbs_certificate.as_ref().to_vec(),
            signature_algorithm: signature_algorithm_from_oid(&signature_oid),
            signature_oid,
            signature: cert.signature_value.data.to_vec(),
        })
    }

    /// Raw DER.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name (DER).
    pub fn subject(&self) -> &[u8] {
        &self.subject
    }

    /// Issuer distinguished name (DER).
    pub fn issuer(&self) -> &[u8] {
        &self.issuer
    }

    /// Whether subject and issuer are the same name.
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    /// DNS subjectAltNames.
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    /// IP subjectAltNames.
    pub fn ip_addresses(&self) -> &[IpAddr] {
        &self.ip_addresses
    }

    /// Whether the certificate carries any subjectAltName.
    pub fn has_subject_alt_names(&self) -> bool {
        !self.dns_names.is_empty() || !self.ip_addresses.is_empty()
    }

    /// basicConstraints cA flag.
    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// Subject public key.
    pub fn public_key(&self) -> &PublicKeyInfo {
        &self.public_key
    }

    /// Check the validity window against `now` (unix seconds).
    pub fn check_validity(&self, now: i64) -> Result<()> {
        if now < self.not_before {
            return Err(VerificationError::CertificateNotYetValid.into());
        }
        if now > self.not_after {
            return Err(VerificationError::CertificateExpired.into());
        }
        Ok(())
    }

    /// Verify that `issuer`'s key produced this certificate's signature.
    pub fn verify_signed_by(
        &self,
        provider: &dyn CryptoProvider,
        issuer: &PublicKeyInfo,
    ) -> Result<()> {
        let algorithm = self.signature_algorithm.ok_or_else(|| {
            VerificationError::UnsupportedCertificate(format!(
                "signature algorithm {}",
                self.signature_oid
            ))
        })?;
        if algorithm.key_kind() != issuer.kind {
            return Err(VerificationError::BadSignature(format!(
                "{} signature from a {} key",
                algorithm.name(),
                issuer.kind.name()
            ))
            .into());
        }
        provider
            .signature(algorithm)?
            .verify(&issuer.bytes, &self.tbs, &self.signature)
            .map_err(|e| VerificationError::BadSignature(e.to_string()).into())
    }

    /// Verify a handshake signature made with this certificate's key.
    pub fn verify_signature(
        &self,
        provider: &dyn CryptoProvider,
        algorithm: SignatureAlgorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        if algorithm.key_kind() != self.public_key.kind {
            return Err(VerificationError::BadSignature(format!(
                "{} does not match {} certificate key",
                algorithm.name(),
                self.public_key.kind.name()
            ))
            .into());
        }
        provider
            .signature(algorithm)?
            .verify(&self.public_key.bytes, message, signature)
            .map_err(|e| VerificationError::BadSignature(e.to_string()).into())
    }
}

fn ip_from_bytes(raw: &[u8]) -> Option<IpAddr> {
    match raw.len() {
        4 => {
            let octets: [u8; 4] = raw.try_into().ok()?;
            Some(IpAddr::from(octets))
        },
        16 => {
            let octets: [u8; 16] = raw.try_into().ok()?;
            Some(IpAddr::from(octets))
        },
        _ => None,
    }
}

/// Map a certificate signature OID to a supported algorithm.
pub fn signature_algorithm_from_oid(oid: &str) -> Option<SignatureAlgorithm> {
    match oid {
        "1.2.840.113549.1.1.5" => Some(SignatureAlgorithm::RsaPkcs1Sha1),
        "1.2.840.113549.1.1.11" => Some(SignatureAlgorithm::RsaPkcs1Sha256),
        "1.2.840.113549.1.1.12" => Some(SignatureAlgorithm::RsaPkcs1Sha384),
        "1.2.840.113549.1.1.13" => Some(SignatureAlgorithm::RsaPkcs1Sha512),
        "1.2.840.10045.4.3.2" => Some(SignatureAlgorithm::EcdsaSha256),
        "1.2.840.10045.4.3.3" => Some(SignatureAlgorithm::EcdsaSha384),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ironwire_certificates::{CertificateBuilder, KeyType};
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_parse_generated_certificate() {
        let provider = RustCryptoProvider::new();
        let ca = CertificateBuilder::ca("Test Root", KeyType::EcdsaP256)
            .build_self_signed(&provider)
            .expect("Failed to build CA");
        let leaf = CertificateBuilder::server("server.test", KeyType::EcdsaP256)
            .with_dns_name("www.server.test")
            .with_ip_address("10.1.2.3".parse().unwrap())
            .build_signed_by(&provider, &ca)
            .expect("Failed to build leaf");

        let parsed = PeerCertificate::from_der(&leaf.der).unwrap();
        assert_eq!(parsed.public_key().kind, KeyKind::Ec);
        assert_eq!(parsed.public_key().bytes.len(), 65);
        assert!(parsed
            .dns_names()
            .iter()
            .any(|n| n == "www.server.test"));
        assert_eq!(
            parsed.ip_addresses(),
            &["10.1.2.3".parse::<IpAddr>().unwrap()]
        );
        assert!(!parsed.is_ca());

        let root = PeerCertificate::from_der(&ca.der).unwrap();
        assert!(root.is_ca());
        assert!(root.is_self_issued());
        assert_eq!(parsed.issuer(), root.subject());
        parsed
            .verify_signed_by(&provider, root.public_key())
            .expect("Failed to verify leaf signature");
    }

    #[test]
    fn test_validity_window() {
        let provider = RustCryptoProvider::new();
        let cert = CertificateBuilder::server("server.test", KeyType::EcdsaP256)
            .build_self_signed(&provider)
            .expect("Failed to build certificate");
        let parsed = PeerCertificate::from_der(&cert.der).unwrap();

        let now = unix_now();
        parsed.check_validity(now).unwrap();
        assert_eq!(
            parsed.check_validity(now + 100 * 365 * 86_400),
            Err(Error::Verification(VerificationError::CertificateExpired))
        );
        assert_eq!(
            parsed.check_validity(now - 100 * 365 * 86_400),
            Err(Error::Verification(VerificationError::CertificateNotYetValid))
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            PeerCertificate::from_der(&[0x30, 0x03, 1, 2, 3]),
            Err(Error::Verification(VerificationError::MalformedCertificate(_)))
        ));
    }

    #[test]
    fn test_signature_oids() {
        assert_eq!(
            signature_algorithm_from_oid("1.2.840.113549.1.1.11"),
            Some(SignatureAlgorithm::RsaPkcs1Sha256)
        );
        assert_eq!(signature_algorithm_from_oid("1.3.101.112"), None);
    }

    fn unix_now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }
}
