//! # Ironwire
//!
//! TLS 1.2 client and server streams over any tokio transport.
//!
//! The protocol lives in [`ironwire_core`] as sans-IO state machines; this
//! crate runs them over an `AsyncRead + AsyncWrite` transport with a reader
//! task, a shared record writer and bounded channels between them.
//!
//! ## Quick Start
//!
//! ### Client
//!
//! ```rust,no_run
//! # async fn example(trust: std::sync::Arc<ironwire::TrustStore>) -> Result<(), Box<dyn std::error::Error>> {
//! use ironwire::{ClientConfig, TlsStream};
//! use ironwire_crypto_rustcrypto::RustCryptoProvider;
//! use std::sync::Arc;
//! use tokio::net::TcpStream;
//!
//! let config = ClientConfig::builder()
//!     .with_provider(Arc::new(RustCryptoProvider::new()))
//!     .with_trust_manager(trust)
//!     .with_server_name("example.com")
//!     .build()?;
//!
//! let tcp = TcpStream::connect("example.com:443").await?;
//! let mut tls = TlsStream::connect(Arc::new(config), tcp).await?;
//! tls.write(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").await?;
//! while let Some(chunk) = tls.read().await? {
//!     println!("{} bytes", chunk.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Server
//!
//! ```rust,no_run
//! # async fn example(key: ironwire::CertifiedKey) -> Result<(), Box<dyn std::error::Error>> {
//! use ironwire::{ServerConfig, TlsStream};
//! use ironwire_crypto_rustcrypto::RustCryptoProvider;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! let config = Arc::new(
//!     ServerConfig::builder()
//!         .with_provider(Arc::new(RustCryptoProvider::new()))
//!         .add_certificate(key)
//!         .build()?,
//! );
//!
//! let listener = TcpListener::bind("0.0.0.0:443").await?;
//! loop {
//!     let (tcp, _) = listener.accept().await?;
//!     let config = config.clone();
//!     tokio::spawn(async move {
//!         if let Ok(mut tls) = TlsStream::accept(config, tcp).await {
//!             let _ = tls.write(b"hello").await;
//!             let _ = tls.close().await;
//!         }
//!     });
//! }
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    unused_qualifications
)]
#![forbid(unsafe_code)]

pub use ironwire_core::{
    self, Alert, AlertDescription, CertifiedKey, CipherSuite, ClientAuth, ClientConfig, Error,
    NegotiatedSession, ProtocolVersion, Result, ServerConfig, TrustManager, TrustStore,
    VerificationError,
};
pub use ironwire_crypto;

pub mod client;
pub mod server;
pub mod stream;

mod handshake;
mod pump;
mod record_io;

pub use client::connect;
pub use server::accept;
pub use stream::{TlsReader, TlsStream, TlsWriter};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the ironwire version.
pub fn version() -> &'static str {
    VERSION
}
