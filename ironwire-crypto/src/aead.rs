//! AEAD (Authenticated Encryption with Associated Data) cipher interface.

use crate::Result;

/// AEAD cipher algorithms used by TLS 1.2 GCM suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AeadAlgorithm {
    /// AES-128-GCM
    Aes128Gcm,
    /// AES-256-GCM
    Aes256Gcm,
}

impl AeadAlgorithm {
    /// Get the key size in bytes for this algorithm.
    pub const fn key_size(self) -> usize {
        match self {
            AeadAlgorithm::Aes128Gcm => 16,
            AeadAlgorithm::Aes256Gcm => 32,
        }
    }

    /// Get the nonce size in bytes for this algorithm.
    pub const fn nonce_size(self) -> usize {
        12
    }

    /// Get the authentication tag size in bytes for this algorithm.
    pub const fn tag_size(self) -> usize {
        16
    }

    /// Get the name of this algorithm as used in TLS.
    pub const fn name(self) -> &'static str {
        match self {
            AeadAlgorithm::Aes128Gcm => "AES_128_GCM",
            AeadAlgorithm::Aes256Gcm => "AES_256_GCM",
        }
    }
}

/// AEAD cipher trait.
///
/// # Security Requirements
///
/// - Tag verification MUST be constant-time
/// - Nonces MUST NOT be reused with the same key
pub trait Aead: Send + Sync {
    /// Encrypt and authenticate plaintext.
    ///
    /// # Arguments
    ///
    /// * `key` - Encryption key (size must match algorithm)
    /// * `nonce` - Nonce (size must match algorithm, unique per encryption)
    /// * `aad` - Additional authenticated data
    /// * `plaintext` - Data to encrypt
    ///
    /// # Returns
    ///
    /// Ciphertext with authentication tag appended.
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt and verify ciphertext (tag appended).
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` if the tag does not verify.
    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>;

    /// Get the algorithm this cipher implements.
    fn algorithm(&self) -> AeadAlgorithm;

    /// Get the authentication tag size in bytes.
    fn tag_size(&self) -> usize {
        self.algorithm().tag_size()
    }
}
