//! AES-CBC implementations using `aes` and `cbc`.

use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ironwire_crypto::{BlockCipher, BlockCipherAlgorithm, Error, Result};

/// Create a CBC block cipher instance for the specified algorithm.
pub fn create_block_cipher(algorithm: BlockCipherAlgorithm) -> Result<Box<dyn BlockCipher>> {
    Ok(Box::new(AesCbc { algorithm }))
}

/// AES in CBC mode without padding.
#[derive(Debug)]
struct AesCbc {
    algorithm: BlockCipherAlgorithm,
}

impl AesCbc {
    fn check(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<()> {
        if key.len() != self.algorithm.key_size() {
            return Err(Error::InvalidKeySize {
                expected: self.algorithm.key_size(),
                actual: key.len(),
            });
        }
        if iv.len() != self.algorithm.block_size() {
            return Err(Error::InvalidNonceSize {
                expected: self.algorithm.block_size(),
                actual: iv.len(),
            });
        }
        if data.len() % self.algorithm.block_size() != 0 {
            return Err(Error::InvalidLength);
        }
        Ok(())
    }
}

fn encrypt_with<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: KeyIvInit + BlockEncryptMut,
{
    let encryptor = C::new_from_slices(key, iv).map_err(|_| Error::InvalidLength)?;
    Ok(encryptor.encrypt_padded_vec_mut::<NoPadding>(data))
}

fn decrypt_with<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: KeyIvInit + BlockDecryptMut,
{
    let decryptor = C::new_from_slices(key, iv).map_err(|_| Error::InvalidLength)?;
    decryptor
        .decrypt_padded_vec_mut::<NoPadding>(data)
        .map_err(|_| Error::DecryptionFailed)
}

impl BlockCipher for AesCbc {
    fn encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.check(key, iv, data)?;
        match self.algorithm {
            BlockCipherAlgorithm::Aes128Cbc => encrypt_with::<cbc::Encryptor<aes::Aes128>>(key, iv, data),
            BlockCipherAlgorithm::Aes256Cbc => encrypt_with::<cbc::Encryptor<aes::Aes256>>(key, iv, data),
        }
    }

    fn decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.check(key, iv, data)?;
        match self.algorithm {
            BlockCipherAlgorithm::Aes128Cbc => decrypt_with::<cbc::Decryptor<aes::Aes128>>(key, iv, data),
            BlockCipherAlgorithm::Aes256Cbc => decrypt_with::<cbc::Decryptor<aes::Aes256>>(key, iv, data),
        }
    }

    fn algorithm(&self) -> BlockCipherAlgorithm {
        self.algorithm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nist_sp800_38a_cbc_aes128() {
        // F.2.1 CBC-AES128.Encrypt, first block
        let key = hex::decode("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        let iv = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let expected = hex::decode("7649abac8119b246cee98e9b12e9197d").unwrap();

        let cipher = create_block_cipher(BlockCipherAlgorithm::Aes128Cbc).unwrap();
        let ciphertext = cipher.encrypt(&key, &iv, &plaintext).unwrap();
        assert_eq!(ciphertext, expected);
        assert_eq!(cipher.decrypt(&key, &iv, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_partial_block_rejected() {
        let cipher = create_block_cipher(BlockCipherAlgorithm::Aes256Cbc).unwrap();
        assert_eq!(
            cipher.encrypt(&[0u8; 32], &[0u8; 16], &[0u8; 17]),
            Err(Error::InvalidLength)
        );
    }
}
