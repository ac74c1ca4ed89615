//! Error types for ironwire core.
//!
//! Every failure is terminal for the connection. [`Error::alert`] names the
//! alert a peer is told about before the transport is torn down.

use crate::alert::{Alert, AlertDescription};
use core::fmt;

/// Result type for ironwire operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur in ironwire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed wire data: bad length prefix, truncated structure, invalid EC point
    Framing(String),

    /// Record payload length above the maximum frame size
    RecordOverflow(usize),

    /// No common cipher suite or signature algorithm, or other negotiation failure
    Negotiation(String),

    /// Peer offered a protocol version below TLS 1.2
    UnsupportedVersion(u16),

    /// Message type not valid in the current handshake state
    UnexpectedMessage(String),

    /// Certificate, hostname or signature verification failed
    Verification(VerificationError),

    /// Finished verify data mismatch
    FinishedMismatch {
        /// Locally computed verify data
        expected: Vec<u8>,
        /// Verify data received from the peer
        actual: Vec<u8>,
    },

    /// Fatal alert received from peer
    AlertReceived(Alert),

    /// Handshake deadline elapsed
    Timeout,

    /// Connection closed
    Closed,

    /// Cryptographic operation failed
    Crypto(ironwire_crypto::Error),

    /// Transport I/O error
    Io(String),

    /// Invalid configuration
    InvalidConfig(String),

    /// Internal error
    Internal(String),
}

/// Reasons a peer's authentication material is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Peer sent no certificate where one is required
    EmptyChain,

    /// Certificate could not be parsed
    MalformedCertificate(String),

    /// Certificate uses a key or signature algorithm we cannot check
    UnsupportedCertificate(String),

    /// `notAfter` is in the past
    CertificateExpired,

    /// `notBefore` is in the future
    CertificateNotYetValid,

    /// Chain does not lead to a trusted root
    UntrustedChain(String),

    /// Certificate does not cover the expected host
    HostnameMismatch(String),

    /// Signed handshake parameters failed verification
    BadSignature(String),
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerificationError::EmptyChain => write!(f, "empty certificate chain"),
            VerificationError::MalformedCertificate(msg) => {
                write!(f, "malformed certificate: {}", msg)
            },
            VerificationError::UnsupportedCertificate(msg) => {
                write!(f, "unsupported certificate: {}", msg)
            },
            VerificationError::CertificateExpired => write!(f, "certificate expired"),
            VerificationError::CertificateNotYetValid => write!(f, "certificate not yet valid"),
            VerificationError::UntrustedChain(msg) => write!(f, "untrusted chain: {}", msg),
            VerificationError::HostnameMismatch(msg) => write!(f, "hostname mismatch: {}", msg),
            VerificationError::BadSignature(msg) => write!(f, "bad signature: {}", msg),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Framing(msg) => write!(f, "Framing error: {}", msg),
            Error::RecordOverflow(len) => {
                write!(f, "Framing error: record length {} exceeds maximum", len)
            },
            Error::Negotiation(msg) => write!(f, "Negotiation failed: {}", msg),
            Error::UnsupportedVersion(v) => write!(f, "Unsupported protocol version 0x{:04x}", v),
            Error::UnexpectedMessage(msg) => write!(f, "Unexpected message: {}", msg),
            Error::Verification(e) => write!(f, "Verification failed: {}", e),
            Error::FinishedMismatch { expected, actual } => write!(
                f,
                "Finished verify data mismatch: expected {}, got {}",
                to_hex(expected),
                to_hex(actual)
            ),
            Error::AlertReceived(alert) => write!(f, "Alert received: {}", alert),
            Error::Timeout => write!(f, "Handshake timed out"),
            Error::Closed => write!(f, "Connection closed"),
            Error::Crypto(e) => write!(f, "Cryptographic error: {}", e),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl std::error::Error for Error {}

impl From<ironwire_crypto::Error> for Error {
    fn from(e: ironwire_crypto::Error) -> Self {
        Error::Crypto(e)
    }
}

impl From<VerificationError> for Error {
    fn from(e: VerificationError) -> Self {
        Error::Verification(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl Error {
    /// Whether this is a wire framing failure.
    pub fn is_framing(&self) -> bool {
        matches!(self, Error::Framing(_) | Error::RecordOverflow(_))
    }

    /// Alert to send to the peer for a locally detected failure.
    ///
    /// `None` when the failure came from the peer or the transport, where
    /// there is nobody left to tell.
    pub fn alert(&self) -> Option<AlertDescription> {
        use ironwire_crypto::Error as CryptoError;

        Some(match self {
            Error::Framing(_) => AlertDescription::DecodeError,
            Error::RecordOverflow(_) => AlertDescription::RecordOverflow,
            Error::Negotiation(_) => AlertDescription::HandshakeFailure,
            Error::UnsupportedVersion(_) => AlertDescription::ProtocolVersion,
            Error::UnexpectedMessage(_) => AlertDescription::UnexpectedMessage,
            Error::Verification(e) => match e {
                VerificationError::CertificateExpired
                | VerificationError::CertificateNotYetValid => {
                    AlertDescription::CertificateExpired
                },
                VerificationError::UnsupportedCertificate(_) => {
                    AlertDescription::UnsupportedCertificate
                },
                VerificationError::UntrustedChain(_) => AlertDescription::UnknownCa,
                VerificationError::BadSignature(_) => AlertDescription::DecryptError,
                VerificationError::EmptyChain
                | VerificationError::MalformedCertificate(_)
                | VerificationError::HostnameMismatch(_) => AlertDescription::BadCertificate,
            },
            Error::FinishedMismatch { .. } => AlertDescription::DecryptError,
            Error::Crypto(CryptoError::AuthenticationFailed) => AlertDescription::BadRecordMac,
            Error::Crypto(_) | Error::InvalidConfig(_) | Error::Internal(_) => {
                AlertDescription::InternalError
            },
            Error::AlertReceived(_) | Error::Timeout | Error::Closed | Error::Io(_) => {
                return None
            },
        })
    }
}
