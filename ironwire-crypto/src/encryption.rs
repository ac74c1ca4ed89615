//! Asymmetric encryption, used for RSA key transport.

use crate::Result;

/// Asymmetric encryption schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionAlgorithm {
    /// RSAES-PKCS1-v1_5 (RFC 8017 Section 7.2)
    RsaPkcs1v15,
}

impl EncryptionAlgorithm {
    /// Algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            EncryptionAlgorithm::RsaPkcs1v15 => "RSAES-PKCS1-v1_5",
        }
    }
}

/// Asymmetric encryption trait.
///
/// Keys use the same encodings as [`crate::signature`]: PKCS#1 DER for RSA.
pub trait Encryption: Send + Sync {
    /// Encrypt `plaintext` for the holder of `public_key`.
    fn encrypt(&self, public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with `private_key`.
    ///
    /// # Errors
    ///
    /// `DecryptionFailed` on padding or key mismatch.
    fn decrypt(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Get the algorithm this scheme implements.
    fn algorithm(&self) -> EncryptionAlgorithm;
}
