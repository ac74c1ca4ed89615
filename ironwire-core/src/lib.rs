//! # Ironwire Core
//!
//! Sans-IO TLS 1.2 protocol engine.
//!
//! This crate holds everything about a TLS 1.2 connection that does not touch
//! a socket:
//! - Record framing and record protection (AES-GCM, AES-CBC with HMAC-SHA1)
//! - Handshake message codecs and reassembly
//! - PRF, key schedule and transcript
//! - Client and server handshake state machines
//! - Certificate chain and hostname verification
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Public API (ironwire): TlsStream      │
//! └─────────────────┬───────────────────────┘
//!                   │ records, CCS, alerts
//! ┌─────────────────▼───────────────────────┐
//! │       ironwire-core (this crate)        │
//! │  ┌──────────────────────────────────┐   │
//! │  │   Handshake State Machines       │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Message Codecs / Transcript    │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   Record Layer / Protection      │   │
//! │  ├──────────────────────────────────┤   │
//! │  │   PRF / Key Schedule / X.509     │   │
//! │  └──────────────────────────────────┘   │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     ironwire-crypto (trait interface)   │
//! └─────────────────────────────────────────┘
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unused_qualifications
)]
#![forbid(unsafe_code)]

// Re-export crypto interface
pub use ironwire_crypto;

pub mod alert;
pub mod certificate_validator;
pub mod cipher_suites;
pub mod codec;
pub mod config;
pub mod error;
pub mod extensions;
pub mod handshake;
pub mod handshake_io;
pub mod hostname;
pub mod key_exchange;
pub mod key_schedule;
pub mod messages;
pub mod prf;
pub mod protocol;
pub mod record;
pub mod record_protection;
pub mod transcript;
pub mod x509;

// Re-exports
pub use alert::{Alert, AlertDescription, AlertLevel};
pub use certificate_validator::{AcceptAnyCertificate, TrustManager, TrustStore};
pub use cipher_suites::CipherSuite;
pub use config::{CertifiedKey, ClientAuth, ClientConfig, ServerConfig};
pub use error::{Error, Result, VerificationError};
pub use handshake::{
    ClientHandshake, Handshake, HandshakeOutput, NegotiatedSession, ServerHandshake,
};
pub use protocol::{ContentType, ProtocolVersion, Role};
pub use record_protection::RecordProtection;
