//! HMAC implementations using the `hmac` crate.

use hmac::digest::KeyInit;
use hmac::Mac;
use ironwire_crypto::{Error, HashAlgorithm, Hmac, Result};

/// Create an HMAC instance for the specified hash algorithm.
pub fn create_hmac(algorithm: HashAlgorithm, key: &[u8]) -> Result<Box<dyn Hmac>> {
    Ok(match algorithm {
        HashAlgorithm::Sha1 => Box::new(MacImpl::<hmac::Hmac<sha1::Sha1>>::new(key, algorithm)?),
        HashAlgorithm::Sha256 => {
            Box::new(MacImpl::<hmac::Hmac<sha2::Sha256>>::new(key, algorithm)?)
        },
        HashAlgorithm::Sha384 => {
            Box::new(MacImpl::<hmac::Hmac<sha2::Sha384>>::new(key, algorithm)?)
        },
        HashAlgorithm::Sha512 => {
            Box::new(MacImpl::<hmac::Hmac<sha2::Sha512>>::new(key, algorithm)?)
        },
    })
}

/// Incremental HMAC over any RustCrypto `Mac`.
struct MacImpl<M> {
    mac: M,
    algorithm: HashAlgorithm,
}

impl<M: Mac + KeyInit> MacImpl<M> {
    fn new(key: &[u8], algorithm: HashAlgorithm) -> Result<Self> {
        let mac = <M as KeyInit>::new_from_slice(key)
            .map_err(|e| Error::backend("HMAC keying", e))?;
        Ok(Self { mac, algorithm })
    }
}

impl<M: Mac + Send + 'static> Hmac for MacImpl<M> {
    fn update(&mut self, data: &[u8]) {
        Mac::update(&mut self.mac, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.mac.finalize().into_bytes().to_vec()
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}
