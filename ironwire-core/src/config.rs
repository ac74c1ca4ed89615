//! Client and server configuration.
//!
//! ```rust,ignore
//! let config = ClientConfig::builder()
//!     .with_provider(Arc::new(RustCryptoProvider::new()))
//!     .with_trust_manager(Arc::new(TrustStore::from_roots([root.as_slice()])?))
//!     .with_server_name("example.com")
//!     .build()?;
//! ```

use crate::certificate_validator::TrustManager;
use crate::cipher_suites::{supported_suites, CipherSuite};
use crate::error::{Error, Result};
use crate::x509::PeerCertificate;
use ironwire_crypto::{CryptoProvider, KeyExchangeAlgorithm, KeyKind, SignatureAlgorithm};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

/// A certificate chain with the private key of its leaf.
#[derive(Clone)]
pub struct CertifiedKey {
    /// DER certificates, leaf first
    pub chain: Vec<Vec<u8>>,
    /// Leaf private key (PKCS#1 DER for RSA, raw scalar for EC)
    pub private_key: Zeroizing<Vec<u8>>,
    leaf: PeerCertificate,
}

impl fmt::Debug for CertifiedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertifiedKey")
            .field("chain_len", &self.chain.len())
            .field("key_kind", &self.key_kind())
            .finish()
    }
}

impl CertifiedKey {
    /// Pair a chain with its leaf key.
    pub fn new(chain: Vec<Vec<u8>>, private_key: Vec<u8>) -> Result<Self> {
        let leaf_der = chain
            .first()
            .ok_or_else(|| Error::InvalidConfig("Certificate chain is empty".into()))?;
        let leaf = PeerCertificate::from_der(leaf_der)
            .map_err(|e| Error::InvalidConfig(format!("Unusable leaf certificate: {}", e)))?;
        Ok(Self {
            chain,
            private_key: Zeroizing::new(private_key),
            leaf,
        })
    }

    /// Parsed leaf certificate.
    pub fn leaf(&self) -> &PeerCertificate {
        &self.leaf
    }

    /// Kind of the leaf key.
    pub fn key_kind(&self) -> KeyKind {
        self.leaf.public_key().kind
    }

    /// Pick the signature algorithm to sign with, preferring the order of
    /// `offered` when the peer advertised one.
    pub fn choose_signature_algorithm(
        &self,
        local: &[SignatureAlgorithm],
        offered: Option<&[SignatureAlgorithm]>,
    ) -> Option<SignatureAlgorithm> {
        let kind = self.key_kind();
        let usable = |alg: &SignatureAlgorithm| alg.key_kind() == kind && local.contains(alg);
        match offered {
            Some(offered) => offered.iter().copied().find(|a| usable(a)),
            // RFC 5246 Section 7.4.1.4.1 default when nothing was advertised
            None => SignatureAlgorithm::ALL
                .iter()
                .copied()
                .find(|a| usable(a) && a.hash() == ironwire_crypto::HashAlgorithm::Sha1)
                .or_else(|| SignatureAlgorithm::ALL.iter().copied().find(|a| usable(a))),
        }
    }
}

/// Whether a server asks clients for certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientAuth {
    /// Never request a client certificate
    #[default]
    None,
    /// Request one; an empty reply is accepted
    Requested,
    /// Request one; an empty reply fails the handshake
    Required,
}

/// Signature algorithms the provider can verify and produce.
pub fn supported_signature_algorithms(provider: &dyn CryptoProvider) -> Vec<SignatureAlgorithm> {
    SignatureAlgorithm::ALL
        .iter()
        .copied()
        .filter(|alg| provider.supports_signature(*alg))
        .collect()
}

/// Named curves the provider can run ECDH on.
pub fn supported_curves(provider: &dyn CryptoProvider) -> Vec<KeyExchangeAlgorithm> {
    [KeyExchangeAlgorithm::Secp256r1, KeyExchangeAlgorithm::Secp384r1]
        .into_iter()
        .filter(|curve| provider.supports_key_exchange(*curve))
        .collect()
}

fn resolve_suites(
    provider: &dyn CryptoProvider,
    requested: Option<Vec<CipherSuite>>,
) -> Result<Vec<CipherSuite>> {
    let suites: Vec<CipherSuite> = match requested {
        Some(list) => list
            .into_iter()
            .filter(|suite| {
                let ok = suite.is_supported_by(provider);
                if !ok {
                    tracing::debug!("Dropping {} not supported by provider", suite.name());
                }
                ok
            })
            .collect(),
        None => supported_suites(provider),
    };
    if suites.is_empty() {
        return Err(Error::InvalidConfig("No usable cipher suites".into()));
    }
    Ok(suites)
}

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Crypto backend
    pub provider: Arc<dyn CryptoProvider>,
    /// Validates the server's chain
    pub trust_manager: Arc<dyn TrustManager>,
    /// Offered suites, most preferred first
    pub cipher_suites: Vec<CipherSuite>,
    /// Signature algorithms we accept and produce
    pub signature_algorithms: Vec<SignatureAlgorithm>,
    /// Curves offered for ECDHE
    pub curves: Vec<KeyExchangeAlgorithm>,
    /// SNI host name, also checked against the server certificate
    pub server_name: Option<String>,
    /// Chains offered when the server asks for client authentication
    pub client_certificates: Vec<CertifiedKey>,
    /// Overall deadline for the handshake
    pub handshake_timeout: Option<Duration>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("trust_manager", &self.trust_manager)
            .field("cipher_suites", &self.cipher_suites)
            .field("server_name", &self.server_name)
            .field("client_certificates", &self.client_certificates)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    provider: Option<Arc<dyn CryptoProvider>>,
    trust_manager: Option<Arc<dyn TrustManager>>,
    cipher_suites: Option<Vec<CipherSuite>>,
    server_name: Option<String>,
    client_certificates: Vec<CertifiedKey>,
    handshake_timeout: Option<Duration>,
}

impl ClientConfigBuilder {
    /// Set the crypto provider.
    pub fn with_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the trust manager for server certificates.
    pub fn with_trust_manager(mut self, trust_manager: Arc<dyn TrustManager>) -> Self {
        self.trust_manager = Some(trust_manager);
        self
    }

    /// Offer exactly these suites, in this order.
    pub fn with_cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.cipher_suites = Some(suites);
        self
    }

    /// Set the server name for SNI and hostname verification.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Add a client certificate chain.
    pub fn add_client_certificate(mut self, key: CertifiedKey) -> Self {
        self.client_certificates.push(key);
        self
    }

    /// Bound the whole handshake.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Build the client configuration.
    pub fn build(self) -> Result<ClientConfig> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InvalidConfig("No crypto provider".into()))?;
        let trust_manager = self
            .trust_manager
            .ok_or_else(|| Error::InvalidConfig("No trust manager".into()))?;
        if matches!(self.server_name.as_deref(), Some("")) {
            return Err(Error::InvalidConfig("Empty server name".into()));
        }

        let cipher_suites = resolve_suites(provider.as_ref(), self.cipher_suites)?;
        let signature_algorithms = supported_signature_algorithms(provider.as_ref());
        let curves = supported_curves(provider.as_ref());

        Ok(ClientConfig {
            provider,
            trust_manager,
            cipher_suites,
            signature_algorithms,
            curves,
            server_name: self.server_name,
            client_certificates: self.client_certificates,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Crypto backend
    pub provider: Arc<dyn CryptoProvider>,
    /// Candidate certificates, tried in order
    pub certificates: Vec<CertifiedKey>,
    /// Name the chosen certificate must cover
    pub server_name: Option<String>,
    /// Acceptable suites
    pub cipher_suites: Vec<CipherSuite>,
    /// Signature algorithms we accept and produce
    pub signature_algorithms: Vec<SignatureAlgorithm>,
    /// Curves we can run ECDHE on, in preference order
    pub curves: Vec<KeyExchangeAlgorithm>,
    /// Client authentication mode
    pub client_auth: ClientAuth,
    /// Validates client chains
    pub client_trust_manager: Option<Arc<dyn TrustManager>>,
    /// Overall deadline for the handshake
    pub handshake_timeout: Option<Duration>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("certificates", &self.certificates)
            .field("server_name", &self.server_name)
            .field("cipher_suites", &self.cipher_suites)
            .field("client_auth", &self.client_auth)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}

impl ServerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Default)]
pub struct ServerConfigBuilder {
    provider: Option<Arc<dyn CryptoProvider>>,
    certificates: Vec<CertifiedKey>,
    server_name: Option<String>,
    cipher_suites: Option<Vec<CipherSuite>>,
    client_auth: ClientAuth,
    client_trust_manager: Option<Arc<dyn TrustManager>>,
    handshake_timeout: Option<Duration>,
}

impl ServerConfigBuilder {
    /// Set the crypto provider.
    pub fn with_provider(mut self, provider: Arc<dyn CryptoProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add a certificate chain with its key.
    pub fn add_certificate(mut self, key: CertifiedKey) -> Self {
        self.certificates.push(key);
        self
    }

    /// Only serve certificates covering this name.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Accept exactly these suites.
    pub fn with_cipher_suites(mut self, suites: Vec<CipherSuite>) -> Self {
        self.cipher_suites = Some(suites);
        self
    }

    /// Ask clients for certificates, validated by `trust_manager`.
    pub fn with_client_auth(mut self, mode: ClientAuth, trust_manager: Arc<dyn TrustManager>) -> Self {
        self.client_auth = mode;
        self.client_trust_manager = Some(trust_manager);
        self
    }

    /// Bound the whole handshake.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Build the server configuration.
    pub fn build(self) -> Result<ServerConfig> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InvalidConfig("No crypto provider".into()))?;
        if self.certificates.is_empty() {
            return Err(Error::InvalidConfig("No server certificate".into()));
        }
        if self.client_auth != ClientAuth::None && self.client_trust_manager.is_none() {
            return Err(Error::InvalidConfig(
                "Client authentication needs a trust manager".into(),
            ));
        }

        let cipher_suites = resolve_suites(provider.as_ref(), self.cipher_suites)?;
        let signature_algorithms = supported_signature_algorithms(provider.as_ref());
        let curves = supported_curves(provider.as_ref());

        Ok(ServerConfig {
            provider,
            certificates: self.certificates,
            server_name: self.server_name,
            cipher_suites,
            signature_algorithms,
            curves,
            client_auth: self.client_auth,
            client_trust_manager: self.client_trust_manager,
            handshake_timeout: self.handshake_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate_validator::AcceptAnyCertificate;
    use ironwire_certificates::{CertificateBuilder, KeyType};
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    fn ec_key(provider: &RustCryptoProvider) -> CertifiedKey {
        let cert = CertificateBuilder::server("config.test", KeyType::EcdsaP256)
            .build_self_signed(provider)
            .expect("Failed to build certificate");
        CertifiedKey::new(vec![cert.der.clone()], cert.private_key.to_vec()).unwrap()
    }

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::builder()
            .with_provider(Arc::new(RustCryptoProvider::new()))
            .with_trust_manager(Arc::new(AcceptAnyCertificate))
            .build()
            .unwrap();
        assert_eq!(config.cipher_suites, CipherSuite::ALL.to_vec());
        assert_eq!(config.curves.len(), 2);
        assert!(config.server_name.is_none());
    }

    #[test]
    fn test_client_validation() {
        assert!(matches!(
            ClientConfig::builder()
                .with_provider(Arc::new(RustCryptoProvider::new()))
                .build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(ClientConfig::builder()
            .with_provider(Arc::new(RustCryptoProvider::new()))
            .with_trust_manager(Arc::new(AcceptAnyCertificate))
            .with_cipher_suites(Vec::new())
            .build()
            .is_err());
    }

    #[test]
    fn test_server_validation() {
        let provider = RustCryptoProvider::new();
        assert!(ServerConfig::builder()
            .with_provider(Arc::new(RustCryptoProvider::new()))
            .build()
            .is_err());

        let config = ServerConfig::builder()
            .with_provider(Arc::new(RustCryptoProvider::new()))
            .add_certificate(ec_key(&provider))
            .with_client_auth(ClientAuth::Required, Arc::new(AcceptAnyCertificate))
            .build()
            .unwrap();
        assert_eq!(config.client_auth, ClientAuth::Required);
    }

    #[test]
    fn test_certified_key_signature_choice() {
        let provider = RustCryptoProvider::new();
        let key = ec_key(&provider);
        assert_eq!(key.key_kind(), KeyKind::Ec);

        let local = supported_signature_algorithms(&provider);
        let offered = [
            SignatureAlgorithm::RsaPkcs1Sha256,
            SignatureAlgorithm::EcdsaSha384,
            SignatureAlgorithm::EcdsaSha256,
        ];
        assert_eq!(
            key.choose_signature_algorithm(&local, Some(&offered)),
            Some(SignatureAlgorithm::EcdsaSha384)
        );
        assert_eq!(
            key.choose_signature_algorithm(&local, Some(&[SignatureAlgorithm::RsaPkcs1Sha256])),
            None
        );
        assert_eq!(
            key.choose_signature_algorithm(&local, None),
            Some(SignatureAlgorithm::EcdsaSha256)
        );
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(matches!(
            CertifiedKey::new(Vec::new(), vec![1]),
            Err(Error::InvalidConfig(_))
        ));
    }
}
