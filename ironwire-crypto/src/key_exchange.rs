//! Key agreement on named elliptic curves.

use crate::Result;
use zeroize::Zeroize;

/// Named curves usable for ECDHE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyExchangeAlgorithm {
    /// secp256r1 (P-256, NIST curve)
    Secp256r1,
    /// secp384r1 (P-384, NIST curve)
    Secp384r1,
}

impl KeyExchangeAlgorithm {
    /// Field size in bits.
    pub const fn field_size_bits(self) -> usize {
        match self {
            KeyExchangeAlgorithm::Secp256r1 => 256,
            KeyExchangeAlgorithm::Secp384r1 => 384,
        }
    }

    /// Size of one encoded coordinate in bytes.
    pub const fn coordinate_size(self) -> usize {
        (self.field_size_bits() + 7) / 8
    }

    /// Get the public key size in bytes (uncompressed SEC1 point).
    pub const fn public_key_size(self) -> usize {
        1 + 2 * self.coordinate_size()
    }

    /// Get the shared secret size in bytes.
    pub const fn shared_secret_size(self) -> usize {
        self.coordinate_size()
    }

    /// Get the IANA `NamedCurve` codepoint.
    pub const fn to_u16(self) -> u16 {
        match self {
            KeyExchangeAlgorithm::Secp256r1 => 0x0017,
            KeyExchangeAlgorithm::Secp384r1 => 0x0018,
        }
    }

    /// Convert from the IANA `NamedCurve` codepoint.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0017 => Some(KeyExchangeAlgorithm::Secp256r1),
            0x0018 => Some(KeyExchangeAlgorithm::Secp384r1),
            _ => None,
        }
    }

    /// Get the curve name.
    pub const fn name(self) -> &'static str {
        match self {
            KeyExchangeAlgorithm::Secp256r1 => "secp256r1",
            KeyExchangeAlgorithm::Secp384r1 => "secp384r1",
        }
    }
}

/// Private key for key exchange, zeroized on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct PrivateKey {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl PrivateKey {
    /// Create a new private key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the private key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Public key for key exchange (uncompressed SEC1 point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    /// Create a new public key from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the public key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert to owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Shared secret from key exchange, zeroized on drop.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("bytes", &"<redacted>")
            .finish()
    }
}

impl SharedSecret {
    /// Create a new shared secret from bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Get the shared secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Key agreement trait.
///
/// ```rust,no_run
/// use ironwire_crypto::KeyExchange;
///
/// fn key_exchange_example(kex: &dyn KeyExchange, peer_public_key: &[u8]) {
///     let (private_key, _public_key) = kex.generate_keypair().unwrap();
///     let _shared_secret = kex.exchange(&private_key, peer_public_key).unwrap();
/// }
/// ```
pub trait KeyExchange: Send + Sync {
    /// Generate an ephemeral key pair.
    fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)>;

    /// Compute the shared secret with a peer's uncompressed public point.
    ///
    /// # Errors
    ///
    /// `InvalidPublicKey` if the peer point is not on the curve.
    fn exchange(&self, private_key: &PrivateKey, peer_public_key: &[u8]) -> Result<SharedSecret>;

    /// Get the algorithm this key exchange implements.
    fn algorithm(&self) -> KeyExchangeAlgorithm;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curve_sizes() {
        assert_eq!(KeyExchangeAlgorithm::Secp256r1.coordinate_size(), 32);
        assert_eq!(KeyExchangeAlgorithm::Secp256r1.public_key_size(), 65);
        assert_eq!(KeyExchangeAlgorithm::Secp384r1.coordinate_size(), 48);
        assert_eq!(KeyExchangeAlgorithm::Secp384r1.public_key_size(), 97);
    }

    #[test]
    fn test_named_curve_codes() {
        assert_eq!(
            KeyExchangeAlgorithm::from_u16(23),
            Some(KeyExchangeAlgorithm::Secp256r1)
        );
        assert_eq!(
            KeyExchangeAlgorithm::from_u16(24),
            Some(KeyExchangeAlgorithm::Secp384r1)
        );
        assert_eq!(KeyExchangeAlgorithm::from_u16(29), None);
    }
}
