//! Certificate chain validation.
//!
//! The handshake hands every received chain to a [`TrustManager`]. The
//! stock implementation, [`TrustStore`], checks:
//! - every certificate is inside its validity window
//! - each certificate's issuer is the subject of the next one
//! - each signature verifies with the next certificate's key
//! - the last certificate is a trusted root, or is signed by one

use crate::error::{Result, VerificationError};
use crate::x509::PeerCertificate;
use ironwire_crypto::CryptoProvider;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Decides whether a peer's certificate chain is trusted.
pub trait TrustManager: Send + Sync + fmt::Debug {
    /// Validate `chain` (leaf first) at time `now` (unix seconds).
    fn verify_chain(
        &self,
        provider: &dyn CryptoProvider,
        chain: &[PeerCertificate],
        now: i64,
    ) -> Result<()>;
}

/// Parse a DER chain as received in a Certificate message.
pub fn parse_chain(chain: &[Vec<u8>]) -> Result<Vec<PeerCertificate>> {
    chain.iter().map(|der| PeerCertificate::from_der(der)).collect()
}

/// Current time in unix seconds.
///
/// A clock set before 1970 reads as the epoch.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| seconds_to_i64(d.as_secs()))
        .unwrap_or(0)
}

fn seconds_to_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Trust anchored in a fixed set of root certificates.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    roots: Vec<PeerCertificate>,
}

impl TrustStore {
    /// Empty store; trusts nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a DER-encoded root.
    pub fn add_root(&mut self, der: &[u8]) -> Result<()> {
        self.roots.push(PeerCertificate::from_der(der)?);
        Ok(())
    }

    /// Build a store from DER-encoded roots.
    pub fn from_roots<'a>(roots: impl IntoIterator<Item = &'a [u8]>) -> Result<Self> {
        let mut store = Self::new();
        for der in roots {
            store.add_root(der)?;
        }
        Ok(store)
    }

    /// Number of trusted roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether the store has no roots.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn anchor(
        &self,
        provider: &dyn CryptoProvider,
        last: &PeerCertificate,
        now: i64,
    ) -> Result<()> {
        if self.roots.iter().any(|root| root.der() == last.der()) {
            return Ok(());
        }

        let mut last_error = None;
        for root in self.roots.iter().filter(|r| r.subject() == last.issuer()) {
            match root
                .check_validity(now)
                .and_then(|_| last.verify_signed_by(provider, root.public_key()))
            {
                Ok(()) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            VerificationError::UntrustedChain("no trusted root issued this chain".into()).into()
        }))
    }
}

impl TrustManager for TrustStore {
    fn verify_chain(
        &self,
        provider: &dyn CryptoProvider,
        chain: &[PeerCertificate],
        now: i64,
    ) -> Result<()> {
        let (last, _) = chain
            .split_last()
            .ok_or(VerificationError::EmptyChain)?;

        for cert in chain {
            cert.check_validity(now)?;
        }

        for (depth, pair) in chain.windows(2).enumerate() {
            let (child, parent) = (&pair[0], &pair[1]);
            if child.issuer() != parent.subject() {
                return Err(VerificationError::UntrustedChain(format!(
                    "issuer of certificate {} is not the subject of the next",
                    depth
                ))
                .into());
            }
            child.verify_signed_by(provider, parent.public_key())?;
        }

        self.anchor(provider, last, now)?;
        tracing::debug!("Certificate chain of {} verified", chain.len());
        Ok(())
    }
}

/// Accepts any non-empty chain without checking it. Testing only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyCertificate;

impl TrustManager for AcceptAnyCertificate {
    fn verify_chain(
        &self,
        _provider: &dyn CryptoProvider,
        chain: &[PeerCertificate],
        _now: i64,
    ) -> Result<()> {
        if chain.is_empty() {
            return Err(VerificationError::EmptyChain.into());
        }
        tracing::warn!("Accepting certificate chain without verification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ironwire_certificates::{CertificateBuilder, GeneratedCertificate, KeyType};
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_clock_seconds_saturate() {
        assert_eq!(seconds_to_i64(1_700_000_000), 1_700_000_000);
        assert_eq!(seconds_to_i64(u64::MAX), i64::MAX);
        assert!(unix_now() > 1_600_000_000);
    }

    fn pki(provider: &RustCryptoProvider) -> (GeneratedCertificate, GeneratedCertificate) {
        let ca = CertificateBuilder::ca("Chain Root", KeyType::EcdsaP256)
            .build_self_signed(provider)
            .expect("Failed to build CA");
        let leaf = CertificateBuilder::server("chain.test", KeyType::EcdsaP256)
            .build_signed_by(provider, &ca)
            .expect("Failed to build leaf");
        (ca, leaf)
    }

    #[test]
    fn test_chain_to_trusted_root() {
        let provider = RustCryptoProvider::new();
        let (ca, leaf) = pki(&provider);
        let store = TrustStore::from_roots([ca.der.as_slice()]).unwrap();

        let chain = parse_chain(&[leaf.der.clone()]).unwrap();
        store.verify_chain(&provider, &chain, unix_now()).unwrap();

        // root included in the chain
        let chain = parse_chain(&[leaf.der.clone(), ca.der.clone()]).unwrap();
        store.verify_chain(&provider, &chain, unix_now()).unwrap();
    }

    #[test]
    fn test_unknown_root_rejected() {
        let provider = RustCryptoProvider::new();
        let (_, leaf) = pki(&provider);
        let (other_ca, _) = pki(&provider);
        let store = TrustStore::from_roots([other_ca.der.as_slice()]).unwrap();

        let chain = parse_chain(&[leaf.der]).unwrap();
        // same subject name, different key
        assert!(matches!(
            store.verify_chain(&provider, &chain, unix_now()),
            Err(Error::Verification(VerificationError::BadSignature(_)))
        ));
        assert!(matches!(
            TrustStore::new().verify_chain(&provider, &chain, unix_now()),
            Err(Error::Verification(VerificationError::UntrustedChain(_)))
        ));
    }

    #[test]
    fn test_expired_leaf_rejected() {
        let provider = RustCryptoProvider::new();
        let (ca, leaf) = pki(&provider);
        let store = TrustStore::from_roots([ca.der.as_slice()]).unwrap();
        let chain = parse_chain(&[leaf.der]).unwrap();
        assert_eq!(
            store.verify_chain(&provider, &chain, unix_now() + 10 * 365 * 86_400),
            Err(Error::Verification(VerificationError::CertificateExpired))
        );
    }

    #[test]
    fn test_broken_issuer_link() {
        let provider = RustCryptoProvider::new();
        let (ca, leaf) = pki(&provider);
        let stranger = CertificateBuilder::ca("Someone Else", KeyType::EcdsaP256)
            .build_self_signed(&provider)
            .expect("Failed to build stranger");
        let store = TrustStore::from_roots([ca.der.as_slice()]).unwrap();
        let chain = parse_chain(&[leaf.der, stranger.der]).unwrap();
        assert!(matches!(
            store.verify_chain(&provider, &chain, unix_now()),
            Err(Error::Verification(VerificationError::UntrustedChain(_)))
        ));
    }

    #[test]
    fn test_empty_chain() {
        let provider = RustCryptoProvider::new();
        assert_eq!(
            TrustStore::new().verify_chain(&provider, &[], unix_now()),
            Err(Error::Verification(VerificationError::EmptyChain))
        );
        assert!(AcceptAnyCertificate
            .verify_chain(&provider, &[], unix_now())
            .is_err());
    }
}
