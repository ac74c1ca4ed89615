//! # Ironwire Certificates
//!
//! Generates X.509 v3 certificates for tests, demos and benchmarks: a CA,
//! server leaves carrying DNS/IP subjectAltNames, and client leaves. Keys
//! are generated and certificates signed through an `ironwire-crypto`
//! provider, so the output matches what that provider can verify.
//!
//! Not meant for production PKI.

#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

mod builder;
mod der;

pub use builder::{CertificateBuilder, GeneratedCertificate, KeyType};

use std::fmt;

/// Result type for certificate generation.
pub type Result<T> = core::result::Result<T, Error>;

/// Certificate generation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Key generation or signing failed
    Crypto(ironwire_crypto::Error),

    /// The requested certificate cannot be expressed
    InvalidInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Crypto(e) => write!(f, "Crypto error: {}", e),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<ironwire_crypto::Error> for Error {
    fn from(err: ironwire_crypto::Error) -> Self {
        Error::Crypto(err)
    }
}
