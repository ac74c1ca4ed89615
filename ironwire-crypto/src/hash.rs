//! Hash function interface.

/// Hash algorithms, identified by their TLS 1.2 `HashAlgorithm` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1 (20 bytes output), only for HMAC and legacy signatures
    Sha1,
    /// SHA-256 (32 bytes output)
    Sha256,
    /// SHA-384 (48 bytes output)
    Sha384,
    /// SHA-512 (64 bytes output)
    Sha512,
}

impl HashAlgorithm {
    /// Get the output size in bytes for this hash algorithm.
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Get the name of this algorithm.
    pub const fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// TLS 1.2 wire code (RFC 5246 Section 7.4.1.4.1).
    pub const fn to_u8(self) -> u8 {
        match self {
            HashAlgorithm::Sha1 => 2,
            HashAlgorithm::Sha256 => 4,
            HashAlgorithm::Sha384 => 5,
            HashAlgorithm::Sha512 => 6,
        }
    }

    /// Parse a TLS 1.2 wire code.
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(HashAlgorithm::Sha1),
            4 => Some(HashAlgorithm::Sha256),
            5 => Some(HashAlgorithm::Sha384),
            6 => Some(HashAlgorithm::Sha512),
            _ => None,
        }
    }
}

/// Hash function trait.
///
/// ```rust,ignore
/// fn hash_example(mut hash: Box<dyn Hash>) -> Vec<u8> {
///     hash.update(b"Hello, ");
///     hash.update(b"world!");
///     hash.finalize()
/// }
/// ```
pub trait Hash: Send {
    /// Update the hash state with more data.
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the digest.
    fn finalize(self: Box<Self>) -> Vec<u8>;

    /// Get the algorithm this hash implements.
    fn algorithm(&self) -> HashAlgorithm;

    /// Get the output size in bytes for this hash function.
    fn output_size(&self) -> usize {
        self.algorithm().output_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes() {
        for alg in [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            assert_eq!(HashAlgorithm::from_u8(alg.to_u8()), Some(alg));
        }
        assert_eq!(HashAlgorithm::from_u8(1), None);
    }
}
