//! AEAD cipher implementations using `aes-gcm`.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead as _, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use ironwire_crypto::{Aead, AeadAlgorithm, Error, Result};

/// Create an AEAD cipher instance for the specified algorithm.
pub fn create_aead(algorithm: AeadAlgorithm) -> Result<Box<dyn Aead>> {
    match algorithm {
        AeadAlgorithm::Aes128Gcm => Ok(Box::new(GcmImpl::<Aes128Gcm>::new(algorithm))),
        AeadAlgorithm::Aes256Gcm => Ok(Box::new(GcmImpl::<Aes256Gcm>::new(algorithm))),
    }
}

/// AES-GCM with a 12-byte nonce and a 16-byte tag.
struct GcmImpl<C> {
    algorithm: AeadAlgorithm,
    _cipher: std::marker::PhantomData<fn() -> C>,
}

impl<C> GcmImpl<C> {
    fn new(algorithm: AeadAlgorithm) -> Self {
        Self {
            algorithm,
            _cipher: std::marker::PhantomData,
        }
    }

    fn check_sizes(&self, key: &[u8], nonce: &[u8]) -> Result<()> {
        if key.len() != self.algorithm.key_size() {
            return Err(Error::InvalidKeySize {
                expected: self.algorithm.key_size(),
                actual: key.len(),
            });
        }
        if nonce.len() != self.algorithm.nonce_size() {
            return Err(Error::InvalidNonceSize {
                expected: self.algorithm.nonce_size(),
                actual: nonce.len(),
            });
        }
        Ok(())
    }
}

impl<C> Aead for GcmImpl<C>
where
    C: KeyInit + aes_gcm::aead::Aead,
{
    fn seal(&self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, nonce)?;
        let cipher = C::new_from_slice(key).map_err(|_| Error::InvalidKeySize {
            expected: self.algorithm.key_size(),
            actual: key.len(),
        })?;
        cipher
            .encrypt(GenericArray::from_slice(nonce), Payload { msg: plaintext, aad })
            .map_err(|_| Error::EncryptionFailed)
    }

    fn open(&self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_sizes(key, nonce)?;
        if ciphertext.len() < self.algorithm.tag_size() {
            return Err(Error::AuthenticationFailed);
        }
        let cipher = C::new_from_slice(key).map_err(|_| Error::InvalidKeySize {
            expected: self.algorithm.key_size(),
            actual: key.len(),
        })?;
        cipher
            .decrypt(GenericArray::from_slice(nonce), Payload { msg: ciphertext, aad })
            .map_err(|_| Error::AuthenticationFailed)
    }

    fn algorithm(&self) -> AeadAlgorithm {
        self.algorithm
    }
}
