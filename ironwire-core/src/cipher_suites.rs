//! TLS 1.2 Cipher Suite Registry
//!
//! TLS 1.2 cipher suites specify the complete cryptographic bundle:
//! - Key exchange (ECDHE, RSA key transport)
//! - Authentication (RSA, ECDSA)
//! - Record protection (AES-GCM, or AES-CBC with HMAC-SHA1)
//! - PRF hash (SHA-256, SHA-384)
//!
//! Format: TLS_{KeyExchange}_{Authentication}_WITH_{Encryption}_{Hash}
//!
//! The registry order of [`CipherSuite::ALL`] is the default preference
//! order offered by clients.

use ironwire_crypto::{
    AeadAlgorithm, BlockCipherAlgorithm, CryptoProvider, EncryptionAlgorithm, HashAlgorithm,
    KeyExchangeAlgorithm, KeyKind, SignatureAlgorithm,
};

/// How the pre-master secret is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeKind {
    /// Client encrypts a random pre-master secret to the server's RSA key
    Rsa,
    /// Ephemeral ECDH on a named curve, parameters signed by the server
    Ecdhe,
}

/// Record protection transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkCipher {
    /// AEAD with explicit 8-byte nonce
    Gcm(AeadAlgorithm),
    /// CBC with explicit IV and HMAC
    Cbc(BlockCipherAlgorithm),
}

/// TLS 1.2 cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CipherSuite {
    /// TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256 (0xC02B) - RFC 5289
    EcdheEcdsaWithAes128GcmSha256 = 0xC02B,

    /// TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384 (0xC02C) - RFC 5289
    EcdheEcdsaWithAes256GcmSha384 = 0xC02C,

    /// TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256 (0xC02F) - RFC 5289
    EcdheRsaWithAes128GcmSha256 = 0xC02F,

    /// TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384 (0xC030) - RFC 5289
    EcdheRsaWithAes256GcmSha384 = 0xC030,

    /// TLS_RSA_WITH_AES_128_GCM_SHA256 (0x009C) - RFC 5288
    RsaWithAes128GcmSha256 = 0x009C,

    /// TLS_RSA_WITH_AES_256_GCM_SHA384 (0x009D) - RFC 5288
    RsaWithAes256GcmSha384 = 0x009D,

    /// TLS_RSA_WITH_AES_128_CBC_SHA (0x002F) - RFC 5246
    RsaWithAes128CbcSha = 0x002F,

    /// TLS_RSA_WITH_AES_256_CBC_SHA (0x0035) - RFC 5246
    RsaWithAes256CbcSha = 0x0035,
}

impl CipherSuite {
    /// Every registered suite, in default preference order.
    pub const ALL: [CipherSuite; 8] = [
        CipherSuite::EcdheEcdsaWithAes128GcmSha256,
        CipherSuite::EcdheEcdsaWithAes256GcmSha384,
        CipherSuite::EcdheRsaWithAes128GcmSha256,
        CipherSuite::EcdheRsaWithAes256GcmSha384,
        CipherSuite::RsaWithAes128GcmSha256,
        CipherSuite::RsaWithAes256GcmSha384,
        CipherSuite::RsaWithAes128CbcSha,
        CipherSuite::RsaWithAes256CbcSha,
    ];

    /// Create from wire format (u16 big-endian).
    pub fn from_u16(value: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|suite| suite.to_u16() == value)
    }

    /// Convert to wire format (u16 big-endian).
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    /// Get cipher suite name as a string.
    pub const fn name(self) -> &'static str {
        match self {
            CipherSuite::EcdheEcdsaWithAes128GcmSha256 => "TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256",
            CipherSuite::EcdheEcdsaWithAes256GcmSha384 => "TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384",
            CipherSuite::EcdheRsaWithAes128GcmSha256 => "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256",
            CipherSuite::EcdheRsaWithAes256GcmSha384 => "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
            CipherSuite::RsaWithAes128GcmSha256 => "TLS_RSA_WITH_AES_128_GCM_SHA256",
            CipherSuite::RsaWithAes256GcmSha384 => "TLS_RSA_WITH_AES_256_GCM_SHA384",
            CipherSuite::RsaWithAes128CbcSha => "TLS_RSA_WITH_AES_128_CBC_SHA",
            CipherSuite::RsaWithAes256CbcSha => "TLS_RSA_WITH_AES_256_CBC_SHA",
        }
    }

    /// Key exchange kind.
    pub const fn key_exchange(self) -> KeyExchangeKind {
        match self {
            CipherSuite::EcdheEcdsaWithAes128GcmSha256
            | CipherSuite::EcdheEcdsaWithAes256GcmSha384
            | CipherSuite::EcdheRsaWithAes128GcmSha256
            | CipherSuite::EcdheRsaWithAes256GcmSha384 => KeyExchangeKind::Ecdhe,
            _ => KeyExchangeKind::Rsa,
        }
    }

    /// Key type the server certificate must carry.
    pub const fn signature_kind(self) -> KeyKind {
        match self {
            CipherSuite::EcdheEcdsaWithAes128GcmSha256
            | CipherSuite::EcdheEcdsaWithAes256GcmSha384 => KeyKind::Ec,
            _ => KeyKind::Rsa,
        }
    }

    /// Hash named by the suite (MAC hash for CBC suites).
    pub const fn hash(self) -> HashAlgorithm {
        match self {
            CipherSuite::EcdheEcdsaWithAes256GcmSha384
            | CipherSuite::EcdheRsaWithAes256GcmSha384
            | CipherSuite::RsaWithAes256GcmSha384 => HashAlgorithm::Sha384,
            CipherSuite::RsaWithAes128CbcSha | CipherSuite::RsaWithAes256CbcSha => {
                HashAlgorithm::Sha1
            },
            _ => HashAlgorithm::Sha256,
        }
    }

    /// PRF and transcript hash. SHA-1 suites use the SHA-256 PRF.
    pub const fn prf_hash(self) -> HashAlgorithm {
        match self.hash() {
            HashAlgorithm::Sha384 => HashAlgorithm::Sha384,
            _ => HashAlgorithm::Sha256,
        }
    }

    /// Record protection transform.
    pub const fn bulk_cipher(self) -> BulkCipher {
        match self {
            CipherSuite::EcdheEcdsaWithAes128GcmSha256
            | CipherSuite::EcdheRsaWithAes128GcmSha256
            | CipherSuite::RsaWithAes128GcmSha256 => BulkCipher::Gcm(AeadAlgorithm::Aes128Gcm),
            CipherSuite::EcdheEcdsaWithAes256GcmSha384
            | CipherSuite::EcdheRsaWithAes256GcmSha384
            | CipherSuite::RsaWithAes256GcmSha384 => BulkCipher::Gcm(AeadAlgorithm::Aes256Gcm),
            CipherSuite::RsaWithAes128CbcSha => BulkCipher::Cbc(BlockCipherAlgorithm::Aes128Cbc),
            CipherSuite::RsaWithAes256CbcSha => BulkCipher::Cbc(BlockCipherAlgorithm::Aes256Cbc),
        }
    }

    /// Encryption key length in bytes.
    pub const fn key_len(self) -> usize {
        match self.bulk_cipher() {
            BulkCipher::Gcm(aead) => aead.key_size(),
            BulkCipher::Cbc(cipher) => cipher.key_size(),
        }
    }

    /// MAC key length in bytes (zero for AEAD suites).
    pub const fn mac_len(self) -> usize {
        match self.bulk_cipher() {
            BulkCipher::Gcm(_) => 0,
            BulkCipher::Cbc(_) => self.hash().output_size(),
        }
    }

    /// IV bytes taken from the key block.
    ///
    /// 4-byte implicit salt for GCM; a block for CBC, where the key block
    /// IV goes unused because every record carries its own.
    pub const fn fixed_iv_len(self) -> usize {
        match self.bulk_cipher() {
            BulkCipher::Gcm(_) => 4,
            BulkCipher::Cbc(cipher) => cipher.block_size(),
        }
    }

    /// Explicit per-record IV or nonce length.
    pub const fn record_iv_len(self) -> usize {
        match self.bulk_cipher() {
            BulkCipher::Gcm(_) => 8,
            BulkCipher::Cbc(cipher) => cipher.block_size(),
        }
    }

    /// Length of the key block derived from the master secret.
    pub const fn key_block_len(self) -> usize {
        2 * (self.mac_len() + self.key_len() + self.fixed_iv_len())
    }

    /// Capability gate: whether `provider` can run every primitive of this suite.
    pub fn is_supported_by(self, provider: &dyn CryptoProvider) -> bool {
        let bulk = match self.bulk_cipher() {
            BulkCipher::Gcm(aead) => provider.supports_aead(aead),
            BulkCipher::Cbc(cipher) => {
                provider.supports_block_cipher(cipher) && provider.supports_hash(self.hash())
            },
        };
        let exchange = match self.key_exchange() {
            KeyExchangeKind::Ecdhe => [KeyExchangeAlgorithm::Secp256r1, KeyExchangeAlgorithm::Secp384r1]
                .into_iter()
                .any(|curve| provider.supports_key_exchange(curve)),
            KeyExchangeKind::Rsa => provider.supports_encryption(EncryptionAlgorithm::RsaPkcs1v15),
        };
        let authentication = SignatureAlgorithm::ALL
            .into_iter()
            .filter(|alg| alg.key_kind() == self.signature_kind())
            .any(|alg| provider.supports_signature(alg));

        bulk && exchange && authentication && provider.supports_hash(self.prf_hash())
    }
}

/// Registered suites that pass the capability gate, in preference order.
pub fn supported_suites(provider: &dyn CryptoProvider) -> Vec<CipherSuite> {
    CipherSuite::ALL
        .into_iter()
        .filter(|suite| suite.is_supported_by(provider))
        .collect()
}

/// Server-side selection: first suite in the client's preference order that
/// the server also supports. Unknown codes are skipped.
pub fn select_cipher_suite(offered: &[u16], supported: &[CipherSuite]) -> Option<CipherSuite> {
    offered
        .iter()
        .filter_map(|code| CipherSuite::from_u16(*code))
        .find(|suite| supported.contains(suite))
}
