//! Errors returned by crypto providers.

use std::fmt;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`CryptoProvider`](crate::CryptoProvider).
///
/// The TLS layer maps [`Error::AuthenticationFailed`] to a `bad_record_mac`
/// alert; everything else becomes `internal_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The provider does not implement this algorithm or operation.
    UnsupportedAlgorithm(String),

    /// Key length does not fit the cipher.
    InvalidKeySize {
        /// Bytes the cipher needs
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// Nonce or IV length does not fit the cipher.
    InvalidNonceSize {
        /// Bytes the cipher needs
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// CBC input that is not a whole number of blocks.
    InvalidLength,

    /// AEAD tag did not verify.
    AuthenticationFailed,

    /// Well-formed signature that does not verify.
    SignatureVerificationFailed,

    /// Signature bytes that cannot be parsed.
    InvalidSignature,

    /// Public key or peer point that cannot be parsed.
    InvalidPublicKey,

    /// Private key that cannot be parsed.
    InvalidPrivateKey,

    /// Sealing or RSA encryption failed.
    EncryptionFailed,

    /// RSA decryption or CBC unpadding failed.
    DecryptionFailed,

    /// The backend library rejected an operation.
    Backend {
        /// What was being done, e.g. "ECDSA signing"
        operation: &'static str,
        /// Backend error text
        reason: String,
    },
}

impl Error {
    /// Wrap a backend library error.
    pub fn backend(operation: &'static str, reason: impl fmt::Display) -> Self {
        Error::Backend {
            operation,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedAlgorithm(s) => write!(f, "Not supported: {}", s),
            Error::InvalidKeySize { expected, actual } => {
                write!(f, "Key must be {} bytes, got {}", expected, actual)
            },
            Error::InvalidNonceSize { expected, actual } => {
                write!(f, "Nonce must be {} bytes, got {}", expected, actual)
            },
            Error::InvalidLength => write!(f, "Input is not a whole number of blocks"),
            Error::AuthenticationFailed => write!(f, "AEAD tag mismatch"),
            Error::SignatureVerificationFailed => write!(f, "Signature does not verify"),
            Error::InvalidSignature => write!(f, "Malformed signature"),
            Error::InvalidPublicKey => write!(f, "Malformed public key"),
            Error::InvalidPrivateKey => write!(f, "Malformed private key"),
            Error::EncryptionFailed => write!(f, "Encryption failed"),
            Error::DecryptionFailed => write!(f, "Decryption failed"),
            Error::Backend { operation, reason } => write!(f, "{} failed: {}", operation, reason),
        }
    }
}

impl std::error::Error for Error {}
