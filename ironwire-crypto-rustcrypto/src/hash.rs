//! Hash function implementations using `sha1` and `sha2`.

use ironwire_crypto::{Hash, HashAlgorithm, Result};
use sha2::Digest;

/// Create a hash instance for the specified algorithm.
pub fn create_hash(algorithm: HashAlgorithm) -> Result<Box<dyn Hash>> {
    Ok(match algorithm {
        HashAlgorithm::Sha1 => Box::new(DigestHash::<sha1::Sha1>::new(algorithm)),
        HashAlgorithm::Sha256 => Box::new(DigestHash::<sha2::Sha256>::new(algorithm)),
        HashAlgorithm::Sha384 => Box::new(DigestHash::<sha2::Sha384>::new(algorithm)),
        HashAlgorithm::Sha512 => Box::new(DigestHash::<sha2::Sha512>::new(algorithm)),
    })
}

/// Incremental hash over any RustCrypto `Digest`.
struct DigestHash<D> {
    inner: D,
    algorithm: HashAlgorithm,
}

impl<D: Digest> DigestHash<D> {
    fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            inner: D::new(),
            algorithm,
        }
    }
}

impl<D: Digest + Send + 'static> Hash for DigestHash<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.inner.finalize().to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}
