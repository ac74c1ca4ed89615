//! RSAES-PKCS1-v1_5 using the `rsa` crate.

use ironwire_crypto::{Encryption, EncryptionAlgorithm, Error, Result};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

/// Create an encryption instance for the specified algorithm.
pub fn create_encryption(algorithm: EncryptionAlgorithm) -> Result<Box<dyn Encryption>> {
    match algorithm {
        EncryptionAlgorithm::RsaPkcs1v15 => Ok(Box::new(RsaPkcs1Encryption)),
    }
}

#[derive(Debug)]
struct RsaPkcs1Encryption;

impl Encryption for RsaPkcs1Encryption {
    fn encrypt(&self, public_key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = RsaPublicKey::from_pkcs1_der(public_key).map_err(|_| Error::InvalidPublicKey)?;
        key.encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext)
            .map_err(|_| Error::EncryptionFailed)
    }

    fn decrypt(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let key =
            RsaPrivateKey::from_pkcs1_der(private_key).map_err(|_| Error::InvalidPrivateKey)?;
        key.decrypt(Pkcs1v15Encrypt, ciphertext)
            .map_err(|_| Error::DecryptionFailed)
    }

    fn algorithm(&self) -> EncryptionAlgorithm {
        EncryptionAlgorithm::RsaPkcs1v15
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};

    #[test]
    fn test_premaster_transport() {
        let private = RsaPrivateKey::new(&mut OsRng, 1024).expect("Failed to generate key");
        let public = RsaPublicKey::from(&private);
        let private_der = private.to_pkcs1_der().unwrap();
        let public_der = public.to_pkcs1_der().unwrap();

        let mut premaster = [0x5au8; 48];
        premaster[0] = 0x03;
        premaster[1] = 0x03;

        let enc = create_encryption(EncryptionAlgorithm::RsaPkcs1v15).unwrap();
        let ciphertext = enc.encrypt(public_der.as_bytes(), &premaster).unwrap();
        assert_eq!(ciphertext.len(), 128);

        let recovered = enc.decrypt(private_der.as_bytes(), &ciphertext).unwrap();
        assert_eq!(recovered, premaster);
    }

    #[test]
    fn test_garbage_key_rejected() {
        let enc = create_encryption(EncryptionAlgorithm::RsaPkcs1v15).unwrap();
        assert_eq!(
            enc.encrypt(b"not a key", b"data"),
            Err(Error::InvalidPublicKey)
        );
    }
}
