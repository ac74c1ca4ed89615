//! Digital signature algorithms for TLS 1.2.
//!
//! Key encodings exchanged through this interface:
//!
//! | Kind  | Signing key                      | Verifying key                     |
//! |-------|----------------------------------|-----------------------------------|
//! | RSA   | PKCS#1 `RSAPrivateKey` DER       | PKCS#1 `RSAPublicKey` DER         |
//! | ECDSA | raw private scalar (32/48 bytes) | uncompressed SEC1 point           |
//!
//! The verifying key forms are exactly the `subjectPublicKey` bit string
//! contents of an X.509 certificate. ECDSA signatures are DER encoded.

use crate::{Error, HashAlgorithm, Result};
use zeroize::Zeroize;

/// Public key family of a certificate or signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// RSA
    Rsa,
    /// Elliptic curve (ECDSA)
    Ec,
}

impl KeyKind {
    /// TLS 1.2 `SignatureAlgorithm` wire code (rsa = 1, ecdsa = 3).
    pub const fn to_u8(self) -> u8 {
        match self {
            KeyKind::Rsa => 1,
            KeyKind::Ec => 3,
        }
    }

    /// Parse a TLS 1.2 `SignatureAlgorithm` wire code.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(KeyKind::Rsa),
            3 => Some(KeyKind::Ec),
            _ => None,
        }
    }

    /// Name of the key family.
    pub const fn name(self) -> &'static str {
        match self {
            KeyKind::Rsa => "RSA",
            KeyKind::Ec => "ECDSA",
        }
    }
}

/// Signature algorithms, identified by their TLS 1.2 (hash, signature) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with SHA-1
    RsaPkcs1Sha1,
    /// RSA PKCS#1 v1.5 with SHA-256
    RsaPkcs1Sha256,
    /// RSA PKCS#1 v1.5 with SHA-384
    RsaPkcs1Sha384,
    /// RSA PKCS#1 v1.5 with SHA-512
    RsaPkcs1Sha512,
    /// ECDSA with SHA-256 (curve taken from the key)
    EcdsaSha256,
    /// ECDSA with SHA-384 (curve taken from the key)
    EcdsaSha384,
}

impl SignatureAlgorithm {
    /// All algorithms in local preference order.
    pub const ALL: [SignatureAlgorithm; 6] = [
        SignatureAlgorithm::EcdsaSha384,
        SignatureAlgorithm::EcdsaSha256,
        SignatureAlgorithm::RsaPkcs1Sha512,
        SignatureAlgorithm::RsaPkcs1Sha384,
        SignatureAlgorithm::RsaPkcs1Sha256,
        SignatureAlgorithm::RsaPkcs1Sha1,
    ];

    /// Hash half of the pair.
    pub const fn hash(self) -> HashAlgorithm {
        match self {
            SignatureAlgorithm::RsaPkcs1Sha1 => HashAlgorithm::Sha1,
            SignatureAlgorithm::RsaPkcs1Sha256 | SignatureAlgorithm::EcdsaSha256 => {
                HashAlgorithm::Sha256
            },
            SignatureAlgorithm::RsaPkcs1Sha384 | SignatureAlgorithm::EcdsaSha384 => {
                HashAlgorithm::Sha384
            },
            SignatureAlgorithm::RsaPkcs1Sha512 => HashAlgorithm::Sha512,
        }
    }

    /// Signature half of the pair.
    pub const fn key_kind(self) -> KeyKind {
        match self {
            SignatureAlgorithm::EcdsaSha256 | SignatureAlgorithm::EcdsaSha384 => KeyKind::Ec,
            _ => KeyKind::Rsa,
        }
    }

    /// Build from a (hash, signature) pair.
    pub const fn from_parts(hash: HashAlgorithm, kind: KeyKind) -> Option<Self> {
        match (hash, kind) {
            (HashAlgorithm::Sha1, KeyKind::Rsa) => Some(SignatureAlgorithm::RsaPkcs1Sha1),
            (HashAlgorithm::Sha256, KeyKind::Rsa) => Some(SignatureAlgorithm::RsaPkcs1Sha256),
            (HashAlgorithm::Sha384, KeyKind::Rsa) => Some(SignatureAlgorithm::RsaPkcs1Sha384),
            (HashAlgorithm::Sha512, KeyKind::Rsa) => Some(SignatureAlgorithm::RsaPkcs1Sha512),
            (HashAlgorithm::Sha256, KeyKind::Ec) => Some(SignatureAlgorithm::EcdsaSha256),
            (HashAlgorithm::Sha384, KeyKind::Ec) => Some(SignatureAlgorithm::EcdsaSha384),
            _ => None,
        }
    }

    /// Wire form: `hash << 8 | signature`.
    pub const fn to_u16(self) -> u16 {
        ((self.hash().to_u8() as u16) << 8) | self.key_kind().to_u8() as u16
    }

    /// Parse the wire form.
    pub const fn from_u16(value: u16) -> Option<Self> {
        let hash = match HashAlgorithm::from_u8((value >> 8) as u8) {
            Some(hash) => hash,
            None => return None,
        };
        let kind = match KeyKind::from_u8(value as u8) {
            Some(kind) => kind,
            None => return None,
        };
        Self::from_parts(hash, kind)
    }

    /// Get the algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            SignatureAlgorithm::RsaPkcs1Sha1 => "rsa_pkcs1_sha1",
            SignatureAlgorithm::RsaPkcs1Sha256 => "rsa_pkcs1_sha256",
            SignatureAlgorithm::RsaPkcs1Sha384 => "rsa_pkcs1_sha384",
            SignatureAlgorithm::RsaPkcs1Sha512 => "rsa_pkcs1_sha512",
            SignatureAlgorithm::EcdsaSha256 => "ecdsa_sha256",
            SignatureAlgorithm::EcdsaSha384 => "ecdsa_sha384",
        }
    }
}

/// Signing key (private key), zeroized on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SigningKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl SigningKey {
    /// Create a new signing key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the signing key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Verification key (public key).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    bytes: Vec<u8>,
}

impl VerifyingKey {
    /// Create a new verifying key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the verifying key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Digital signature trait.
///
/// The message is hashed by the implementation with [`SignatureAlgorithm::hash`].
pub trait Signature: Send + Sync {
    /// Sign a message.
    ///
    /// # Errors
    ///
    /// `InvalidPrivateKey` if the signing key cannot be decoded.
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature.
    ///
    /// # Errors
    ///
    /// - `InvalidPublicKey` if the verifying key cannot be decoded
    /// - `InvalidSignature` if the signature is malformed
    /// - `SignatureVerificationFailed` if the signature does not match
    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;

    /// Get the algorithm this signature implements.
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Generate a key pair for this signature algorithm.
    ///
    /// Optional: not all providers support key generation.
    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        Err(Error::UnsupportedAlgorithm("Key generation not implemented".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_matches_iana_codepoints() {
        assert_eq!(SignatureAlgorithm::RsaPkcs1Sha256.to_u16(), 0x0401);
        assert_eq!(SignatureAlgorithm::RsaPkcs1Sha384.to_u16(), 0x0501);
        assert_eq!(SignatureAlgorithm::EcdsaSha256.to_u16(), 0x0403);
        assert_eq!(SignatureAlgorithm::EcdsaSha384.to_u16(), 0x0503);
        assert_eq!(SignatureAlgorithm::RsaPkcs1Sha1.to_u16(), 0x0201);
    }

    #[test]
    fn test_from_u16_rejects_unknown_pairs() {
        for alg in SignatureAlgorithm::ALL {
            assert_eq!(SignatureAlgorithm::from_u16(alg.to_u16()), Some(alg));
        }
        // ed25519 and rsa_pss are TLS 1.3 schemes
        assert_eq!(SignatureAlgorithm::from_u16(0x0807), None);
        assert_eq!(SignatureAlgorithm::from_u16(0x0804), None);
        // ecdsa with sha1 is not offered
        assert_eq!(SignatureAlgorithm::from_u16(0x0203), None);
    }
}
