//! Block cipher interface (CBC mode, caller-managed padding).

use crate::Result;

/// Block ciphers used by the TLS 1.2 CBC suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockCipherAlgorithm {
    /// AES-128 in CBC mode
    Aes128Cbc,
    /// AES-256 in CBC mode
    Aes256Cbc,
}

impl BlockCipherAlgorithm {
    /// Key size in bytes.
    pub const fn key_size(self) -> usize {
        match self {
            BlockCipherAlgorithm::Aes128Cbc => 16,
            BlockCipherAlgorithm::Aes256Cbc => 32,
        }
    }

    /// Block (and IV) size in bytes.
    pub const fn block_size(self) -> usize {
        16
    }

    /// Algorithm name.
    pub const fn name(self) -> &'static str {
        match self {
            BlockCipherAlgorithm::Aes128Cbc => "AES_128_CBC",
            BlockCipherAlgorithm::Aes256Cbc => "AES_256_CBC",
        }
    }
}

/// CBC-mode block cipher.
///
/// Input lengths must be a multiple of the block size; TLS record padding is
/// applied and checked by the record layer, not here.
pub trait BlockCipher: Send + Sync {
    /// Encrypt `data` with `key` and `iv`.
    fn encrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `data` with `key` and `iv`.
    fn decrypt(&self, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>;

    /// Get the algorithm this cipher implements.
    fn algorithm(&self) -> BlockCipherAlgorithm;

    /// Block size in bytes.
    fn block_size(&self) -> usize {
        self.algorithm().block_size()
    }
}
