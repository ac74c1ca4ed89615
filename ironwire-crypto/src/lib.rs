//! # ironwire cryptographic capability interface
//!
//! The TLS engine never implements cryptographic algorithms itself. It asks a
//! [`CryptoProvider`] for narrow capability objects and invokes them.
//!
//! ## Architecture
//!
//! ```text
//! CryptoProvider (main trait)
//! ├── Aead         (AES-GCM record protection)
//! ├── BlockCipher  (AES-CBC record protection)
//! ├── Hash         (SHA-1, SHA-256, SHA-384, SHA-512)
//! ├── Hmac         (HMAC over any supported hash)
//! ├── Random       (CSPRNG)
//! ├── KeyExchange  (ECDH on named curves)
//! ├── Signature    (RSA PKCS#1 v1.5, ECDSA)
//! └── Encryption   (RSA PKCS#1 v1.5 key transport)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use ironwire_crypto::{CryptoProvider, AeadAlgorithm, Error};
//!
//! fn example(provider: &dyn CryptoProvider) -> Result<(), Error> {
//!     let aead = provider.aead(AeadAlgorithm::Aes128Gcm)?;
//!     let ciphertext = aead.seal(key, nonce, aad, plaintext)?;
//!     let plaintext = aead.open(key, nonce, aad, &ciphertext)?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

pub mod aead;
pub mod cipher;
pub mod encryption;
pub mod error;
pub mod hash;
pub mod hmac;
pub mod key_exchange;
pub mod random;
pub mod signature;

pub use aead::{Aead, AeadAlgorithm};
pub use cipher::{BlockCipher, BlockCipherAlgorithm};
pub use encryption::{Encryption, EncryptionAlgorithm};
pub use error::{Error, Result};
pub use hash::{Hash, HashAlgorithm};
pub use hmac::Hmac;
pub use key_exchange::{KeyExchange, KeyExchangeAlgorithm, PrivateKey, PublicKey, SharedSecret};
pub use random::Random;
pub use signature::{KeyKind, Signature, SignatureAlgorithm, SigningKey, VerifyingKey};

/// The main cryptographic provider trait.
///
/// Implementations hand out capability objects for each algorithm family.
/// Every method returns `UnsupportedAlgorithm` for algorithms the backend
/// cannot provide, which is what the `supports_*` probes are built on.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so a single provider can be shared
/// by every connection through an `Arc<dyn CryptoProvider>`.
pub trait CryptoProvider: Send + Sync + 'static {
    /// Get an AEAD cipher instance.
    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>>;

    /// Get a raw block cipher in CBC mode (no padding applied).
    fn block_cipher(&self, algorithm: BlockCipherAlgorithm) -> Result<Box<dyn BlockCipher>>;

    /// Get a hash function instance.
    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>>;

    /// Get an HMAC instance keyed with `key`.
    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>>;

    /// Get the random number generator.
    fn random(&self) -> &dyn Random;

    /// Get a key agreement instance for a named curve.
    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>>;

    /// Get a signature scheme instance.
    fn signature(&self, algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>>;

    /// Get an asymmetric encryption instance.
    fn encryption(&self, algorithm: EncryptionAlgorithm) -> Result<Box<dyn Encryption>>;

    /// Check if the provider supports a specific AEAD algorithm.
    fn supports_aead(&self, algorithm: AeadAlgorithm) -> bool {
        self.aead(algorithm).is_ok()
    }

    /// Check if the provider supports a specific block cipher.
    fn supports_block_cipher(&self, algorithm: BlockCipherAlgorithm) -> bool {
        self.block_cipher(algorithm).is_ok()
    }

    /// Check if the provider supports a specific hash algorithm.
    fn supports_hash(&self, algorithm: HashAlgorithm) -> bool {
        self.hash(algorithm).is_ok()
    }

    /// Check if the provider supports a specific key exchange algorithm.
    fn supports_key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> bool {
        self.key_exchange(algorithm).is_ok()
    }

    /// Check if the provider supports a specific signature algorithm.
    fn supports_signature(&self, algorithm: SignatureAlgorithm) -> bool {
        self.signature(algorithm).is_ok()
    }

    /// Check if the provider supports a specific encryption algorithm.
    fn supports_encryption(&self, algorithm: EncryptionAlgorithm) -> bool {
        self.encryption(algorithm).is_ok()
    }

    /// Hash `data` in one call.
    fn digest(&self, algorithm: HashAlgorithm, data: &[u8]) -> Result<Vec<u8>> {
        let mut hash = self.hash(algorithm)?;
        hash.update(data);
        Ok(hash.finalize())
    }
}
