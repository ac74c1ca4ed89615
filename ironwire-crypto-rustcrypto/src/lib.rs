//! # RustCrypto-based Cryptography Provider for ironwire
//!
//! Implements the `ironwire-crypto` capability interface on top of the
//! RustCrypto crates.
//!
//! ## Supported Algorithms
//!
//! - **AEAD**: AES-128-GCM, AES-256-GCM
//! - **Block ciphers**: AES-128-CBC, AES-256-CBC
//! - **Hash / HMAC**: SHA-1, SHA-256, SHA-384, SHA-512
//! - **Key Exchange**: ECDH P-256, P-384
//! - **Signatures**: RSA PKCS#1 v1.5 (SHA-1/256/384/512), ECDSA P-256 and P-384
//! - **Encryption**: RSAES-PKCS1-v1_5
//! - **RNG**: OS entropy via `rand::rngs::OsRng`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ironwire_crypto::CryptoProvider;
//! use ironwire_crypto_rustcrypto::RustCryptoProvider;
//!
//! let provider: Arc<dyn CryptoProvider> = Arc::new(RustCryptoProvider::new());
//! assert!(provider.supports_hash(ironwire_crypto::HashAlgorithm::Sha256));
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_qualifications,
    missing_debug_implementations
)]

use ironwire_crypto::{
    Aead, AeadAlgorithm, BlockCipher, BlockCipherAlgorithm, CryptoProvider, Encryption,
    EncryptionAlgorithm, Hash, HashAlgorithm, Hmac, KeyExchange, KeyExchangeAlgorithm, Random,
    Result, Signature, SignatureAlgorithm,
};

pub mod aead;
pub mod cipher;
pub mod encryption;
pub mod hash;
pub mod hmac;
pub mod kex;
pub mod random;
pub mod signature;

use random::OsRandom;

/// Cryptography provider backed by RustCrypto implementations.
///
/// Stateless apart from the RNG handle, so it is cheap to share through an
/// `Arc<dyn CryptoProvider>`.
#[derive(Debug, Default)]
pub struct RustCryptoProvider {
    random: OsRandom,
}

impl RustCryptoProvider {
    /// Create a new provider.
    pub fn new() -> Self {
        Self { random: OsRandom }
    }
}

impl CryptoProvider for RustCryptoProvider {
    fn aead(&self, algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
        aead::create_aead(algorithm)
    }

    fn block_cipher(&self, algorithm: BlockCipherAlgorithm) -> Result<Box<dyn BlockCipher>> {
        cipher::create_block_cipher(algorithm)
    }

    fn hash(&self, algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
        hash::create_hash(algorithm)
    }

    fn hmac(&self, algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
        hmac::create_hmac(algorithm, key)
    }

    fn random(&self) -> &dyn Random {
        &self.random
    }

    fn key_exchange(&self, algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>> {
        kex::create_key_exchange(algorithm)
    }

    fn signature(&self, algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>> {
        signature::create_signature(algorithm)
    }

    fn encryption(&self, algorithm: EncryptionAlgorithm) -> Result<Box<dyn Encryption>> {
        encryption::create_encryption(algorithm)
    }
}
