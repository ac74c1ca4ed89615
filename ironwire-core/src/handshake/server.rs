//! TLS 1.2 Server Handshake State Machine
//!
//! Implements the server side of a full TLS 1.2 handshake per RFC 5246.
//!
//! ## State Transitions
//! ```text
//! WAIT_CLIENT_HELLO
//!   | recv ClientHello
//!   | send ServerHello
//!   | send Certificate
//!   | send ServerKeyExchange        (ECDHE suites only)
//!   | send CertificateRequest       (client auth enabled)
//!   | send ServerHelloDone
//!   v
//! WAIT_CLIENT_CERTIFICATE           (client auth enabled)
//!   | recv Certificate
//!   v
//! WAIT_CLIENT_KEY_EXCHANGE
//!   | recv ClientKeyExchange
//!   v
//! WAIT_CERTIFICATE_VERIFY           (client sent a certificate)
//!   | recv CertificateVerify
//!   v
//! WAIT_CHANGE_CIPHER_SPEC
//!   | recv ChangeCipherSpec
//!   v
//! WAIT_FINISHED
//!   | recv Finished
//!   | send ChangeCipherSpec
//!   | send Finished
//!   v
//! CONNECTED
//! ```

use super::{
    finished_body, record_protection, schedule_mut, send, unexpected, verify_finished,
    Handshake, HandshakeOutput, NegotiatedSession,
};
use crate::certificate_validator::{parse_chain, unix_now};
use crate::cipher_suites::{select_cipher_suite, CipherSuite, KeyExchangeKind};
use crate::config::{CertifiedKey, ClientAuth, ServerConfig};
use crate::error::{Error, Result, VerificationError};
use crate::extensions::{ec_point_formats_extension, Extensions};
use crate::handshake_io::HandshakeMessage;
use crate::hostname::verify_hostname;
use crate::key_exchange::{rsa_decrypt_premaster, EncryptionInfo};
use crate::key_schedule::KeySchedule;
use crate::messages::{
    Certificate, CertificateInfo, CertificateVerify, ClientCertificateType,
    ClientHello, ClientKeyExchange, EcParameters, HelloHeader, ServerHello, ServerKeyExchange,
};
use crate::protocol::{HandshakeType, ProtocolVersion, Role, RANDOM_SIZE};
use crate::record_protection::RecordProtection;
use crate::transcript::Transcript;
use crate::x509::PeerCertificate;
use ironwire_crypto::{CryptoProvider, KeyExchangeAlgorithm, SignatureAlgorithm};
use std::sync::Arc;

/// TLS 1.2 server handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for ClientHello
    WaitClientHello,
    /// Waiting for the client Certificate
    WaitClientCertificate,
    /// Waiting for ClientKeyExchange
    WaitClientKeyExchange,
    /// Waiting for CertificateVerify
    WaitCertificateVerify,
    /// Waiting for the client's ChangeCipherSpec
    WaitChangeCipherSpec,
    /// Waiting for the client Finished
    WaitFinished,
    /// Handshake complete, connection established
    Connected,
    /// Error state
    Failed,
}

/// What the ClientHello led us to.
struct Selection {
    suite: CipherSuite,
    certificate: CertifiedKey,
    signature_algorithm: Option<SignatureAlgorithm>,
    curve: Option<KeyExchangeAlgorithm>,
}

/// TLS 1.2 server handshake context.
pub struct ServerHandshake {
    config: Arc<ServerConfig>,
    state: ServerState,
    transcript: Transcript,
    client_version: u16,
    key_schedule: Option<KeySchedule>,
    certificate: Option<CertifiedKey>,
    ephemeral: Option<EncryptionInfo>,
    client_chain: Vec<Vec<u8>>,
    client_leaf: Option<PeerCertificate>,
    server_name: Option<String>,
}

impl std::fmt::Debug for ServerHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHandshake")
            .field("state", &self.state)
            .field("suite", &self.negotiated_suite())
            .field("server_name", &self.server_name)
            .finish()
    }
}

impl ServerHandshake {
    /// Create a new server handshake.
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            state: ServerState::WaitClientHello,
            transcript: Transcript::new(),
            client_version: 0,
            key_schedule: None,
            certificate: None,
            ephemeral: None,
            client_chain: Vec::new(),
            client_leaf: None,
            server_name: None,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> ServerState {
        self.state
    }

    /// Check if handshake is complete.
    pub fn is_connected(&self) -> bool {
        self.state == ServerState::Connected
    }

    /// SNI name sent by the client.
    pub fn server_name(&self) -> Option<&str> {
        self.server_name.as_deref()
    }

    /// The transcript so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn provider(&self) -> Arc<dyn CryptoProvider> {
        Arc::clone(&self.config.provider)
    }

    /// First configured chain whose key can authenticate `suite`.
    fn find_certificate(
        &self,
        suite: CipherSuite,
        client_algorithms: Option<&[SignatureAlgorithm]>,
    ) -> Option<(CertifiedKey, Option<SignatureAlgorithm>)> {
        self.config.certificates.iter().find_map(|key| {
            if key.key_kind() != suite.signature_kind() {
                return None;
            }
            if let Some(name) = &self.config.server_name {
                if verify_hostname(name, key.leaf()).is_err() {
                    return None;
                }
            }
            match suite.key_exchange() {
                KeyExchangeKind::Rsa => Some((key.clone(), None)),
                KeyExchangeKind::Ecdhe => key
                    .choose_signature_algorithm(&self.config.signature_algorithms, client_algorithms)
                    .map(|alg| (key.clone(), Some(alg))),
            }
        })
    }

    fn select_curve(&self, client_curves: Option<&[KeyExchangeAlgorithm]>) -> Option<KeyExchangeAlgorithm> {
        match client_curves {
            Some(curves) => curves
                .iter()
                .copied()
                .find(|curve| self.config.curves.contains(curve)),
            // RFC 4492 Section 4: no extension means any curve is fine
            None => self.config.curves.first().copied(),
        }
    }

    fn negotiate(&self, hello: &ClientHello) -> Result<Selection> {
        let client_algorithms = hello.extensions.signature_algorithms()?;
        let client_curves = hello.extensions.elliptic_curves()?;
        let curve = self.select_curve(client_curves.as_deref());

        let usable: Vec<CipherSuite> = self
            .config
            .cipher_suites
            .iter()
            .copied()
            .filter(|suite| suite.key_exchange() == KeyExchangeKind::Rsa || curve.is_some())
            .filter(|suite| {
                self.find_certificate(*suite, client_algorithms.as_deref())
                    .is_some()
            })
            .collect();

        let Some(suite) = select_cipher_suite(&hello.cipher_suites, &usable) else {
            return Err(
                match select_cipher_suite(&hello.cipher_suites, &self.config.cipher_suites) {
                    Some(suite) => Error::Negotiation(format!(
                        "No server certificate or curve usable with {}",
                        suite.name()
                    )),
                    None => Error::Negotiation("No cipher suites in common".into()),
                },
            );
        };

        let (certificate, signature_algorithm) = self
            .find_certificate(suite, client_algorithms.as_deref())
            .ok_or_else(|| Error::Internal("Selected certificate vanished".into()))?;

        Ok(Selection {
            suite,
            certificate,
            signature_algorithm,
            curve: match suite.key_exchange() {
                KeyExchangeKind::Ecdhe => curve,
                KeyExchangeKind::Rsa => None,
            },
        })
    }

    fn process_client_hello(&mut self, body: &[u8]) -> Result<Vec<HandshakeOutput>> {
        let hello = ClientHello::decode(body)?;
        if hello.header.version < ProtocolVersion::Tls12.to_u16() {
            return Err(Error::UnsupportedVersion(hello.header.version));
        }
        if !hello.offers_null_compression() {
            return Err(Error::Negotiation(
                "Client does not offer null compression".into(),
            ));
        }
        self.client_version = hello.header.version;
        self.server_name = hello.extensions.server_name()?;

        let selection = self.negotiate(&hello)?;
        let suite = selection.suite;
        tracing::debug!(
            "Negotiated {} for {}",
            suite.name(),
            self.server_name.as_deref().unwrap_or("<no SNI>")
        );

        let provider = self.provider();
        let header = HelloHeader::generate(provider.as_ref(), ProtocolVersion::Tls12.to_u16())?;
        let server_random = header.random;
        let mut extensions = Extensions::new();
        if selection.curve.is_some() && hello.extensions.ec_point_formats()?.is_some() {
            extensions.push(ec_point_formats_extension()?);
        }

        let mut outputs = Vec::new();
        send(
            &mut self.transcript,
            &mut outputs,
            HandshakeType::ServerHello,
            ServerHello::new(header, suite.to_u16(), extensions).encode()?,
        )?;
        send(
            &mut self.transcript,
            &mut outputs,
            HandshakeType::Certificate,
            Certificate::new(selection.certificate.chain.clone()).encode()?,
        )?;

        if let (Some(curve), Some(algorithm)) = (selection.curve, selection.signature_algorithm) {
            let ephemeral = EncryptionInfo::generate(provider.as_ref(), curve)?;
            let params = EcParameters {
                curve,
                point: ephemeral.public_point().clone(),
            };
            let signed =
                ServerKeyExchange::signed_data(&hello.header.random, &server_random, &params)?;
            let signature = provider
                .signature(algorithm)?
                .sign(&selection.certificate.private_key, &signed)?;
            let exchange = ServerKeyExchange {
                params,
                signature_algorithm: algorithm,
                signature,
            };
            send(
                &mut self.transcript,
                &mut outputs,
                HandshakeType::ServerKeyExchange,
                exchange.encode()?,
            )?;
            self.ephemeral = Some(ephemeral);
        }

        let request_certificate = self.config.client_auth != ClientAuth::None;
        if request_certificate {
            let request = CertificateInfo::new(
                vec![ClientCertificateType::RsaSign, ClientCertificateType::EcdsaSign],
                self.config.signature_algorithms.clone(),
                Vec::new(),
            );
            send(
                &mut self.transcript,
                &mut outputs,
                HandshakeType::CertificateRequest,
                request.encode()?,
            )?;
        }

        send(
            &mut self.transcript,
            &mut outputs,
            HandshakeType::ServerHelloDone,
            Vec::new(),
        )?;

        self.key_schedule = Some(KeySchedule::new(suite, hello.header.random, server_random));
        self.certificate = Some(selection.certificate);
        self.state = if request_certificate {
            ServerState::WaitClientCertificate
        } else {
            ServerState::WaitClientKeyExchange
        };
        Ok(outputs)
    }

    fn process_client_certificate(&mut self, body: &[u8]) -> Result<()> {
        let certificate = Certificate::decode(body)?;
        if certificate.is_empty() {
            if self.config.client_auth == ClientAuth::Required {
                return Err(VerificationError::EmptyChain.into());
            }
            tracing::debug!("Client declined to authenticate");
            self.state = ServerState::WaitClientKeyExchange;
            return Ok(());
        }

        let trust_manager = self
            .config
            .client_trust_manager
            .as_ref()
            .ok_or_else(|| Error::Internal("No client trust manager".into()))?;
        let chain = parse_chain(&certificate.chain)?;
        trust_manager.verify_chain(self.config.provider.as_ref(), &chain, unix_now())?;

        self.client_leaf = chain.into_iter().next();
        self.client_chain = certificate.chain;
        self.state = ServerState::WaitClientKeyExchange;
        Ok(())
    }

    fn process_client_key_exchange(&mut self, body: &[u8]) -> Result<()> {
        let provider = self.provider();
        let suite = schedule_mut(&mut self.key_schedule)?.suite();

        let premaster = match suite.key_exchange() {
            KeyExchangeKind::Rsa => {
                let ClientKeyExchange::Rsa(ciphertext) = ClientKeyExchange::decode_rsa(body)? else {
                    return Err(Error::Internal("RSA key exchange decoded as ECDHE".into()));
                };
                let certificate = self
                    .certificate
                    .as_ref()
                    .ok_or_else(|| Error::Internal("No server certificate selected".into()))?;
                rsa_decrypt_premaster(
                    provider.as_ref(),
                    &certificate.private_key,
                    &ciphertext,
                    self.client_version,
                )?
            },
            KeyExchangeKind::Ecdhe => {
                let ephemeral = self
                    .ephemeral
                    .take()
                    .ok_or_else(|| Error::Internal("No ephemeral key generated".into()))?;
                let ClientKeyExchange::Ecdhe(point) =
                    ClientKeyExchange::decode_ecdhe(body, ephemeral.curve())?
                else {
                    return Err(Error::Internal("ECDHE key exchange decoded as RSA".into()));
                };
                ephemeral.derive_premaster(provider.as_ref(), &point)?
            },
        };

        schedule_mut(&mut self.key_schedule)?.derive_master_secret(provider.as_ref(), premaster)?;
        self.state = if self.client_leaf.is_some() {
            ServerState::WaitCertificateVerify
        } else {
            ServerState::WaitChangeCipherSpec
        };
        Ok(())
    }

    fn process_certificate_verify(&mut self, message: &HandshakeMessage) -> Result<()> {
        let verify = CertificateVerify::decode(&message.body)?;
        if !self.config.signature_algorithms.contains(&verify.algorithm) {
            return Err(Error::Negotiation(format!(
                "Client signed with {}, which was not requested",
                verify.algorithm.name()
            )));
        }
        let leaf = self
            .client_leaf
            .as_ref()
            .ok_or_else(|| Error::Internal("CertificateVerify without a client certificate".into()))?;

        let signed = self.transcript.prefix(message.encoded_len())?;
        leaf.verify_signature(
            self.config.provider.as_ref(),
            verify.algorithm,
            signed,
            &verify.signature,
        )?;
        tracing::debug!("Client CertificateVerify accepted");
        self.state = ServerState::WaitChangeCipherSpec;
        Ok(())
    }

    fn process_client_finished(&mut self, message: &HandshakeMessage) -> Result<Vec<HandshakeOutput>> {
        let provider = self.provider();
        let schedule = schedule_mut(&mut self.key_schedule)?;
        verify_finished(
            provider.as_ref(),
            schedule,
            &self.transcript,
            Role::Client,
            message,
        )?;

        let mut outputs = Vec::new();
        let protection = record_protection(provider.as_ref(), schedule, Role::Server, true)?;
        outputs.push(HandshakeOutput::ChangeCipherSpec(protection));
        tracing::debug!("ChangeCipherSpec sent");

        let body = finished_body(provider.as_ref(), schedule, &self.transcript, Role::Server)?;
        let suite = schedule.suite();
        send(&mut self.transcript, &mut outputs, HandshakeType::Finished, body)?;

        self.state = ServerState::Connected;
        tracing::debug!("Server handshake completed with {}", suite.name());
        Ok(outputs)
    }

    fn dispatch(&mut self, message: &HandshakeMessage) -> Result<Vec<HandshakeOutput>> {
        match (self.state, message.msg_type) {
            (ServerState::WaitClientHello, HandshakeType::ClientHello) => {
                return self.process_client_hello(&message.body);
            },
            (ServerState::WaitClientCertificate, HandshakeType::Certificate) => {
                self.process_client_certificate(&message.body)?;
            },
            (ServerState::WaitClientKeyExchange, HandshakeType::ClientKeyExchange) => {
                self.process_client_key_exchange(&message.body)?;
            },
            (ServerState::WaitCertificateVerify, HandshakeType::CertificateVerify) => {
                self.process_certificate_verify(message)?;
            },
            (ServerState::WaitFinished, HandshakeType::Finished) => {
                return self.process_client_finished(message);
            },
            (state, msg_type) => return Err(unexpected(state, msg_type)),
        }
        Ok(Vec::new())
    }
}

impl Handshake for ServerHandshake {
    fn role(&self) -> Role {
        Role::Server
    }

    fn start(&mut self) -> Result<Vec<HandshakeOutput>> {
        Ok(Vec::new())
    }

    fn handle_message(&mut self, message: HandshakeMessage) -> Result<Vec<HandshakeOutput>> {
        if message.msg_type == HandshakeType::HelloRequest {
            // only servers send HelloRequest
            self.state = ServerState::Failed;
            return Err(unexpected(self.state, message.msg_type));
        }
        self.transcript.record(&message)?;
        let result = self.dispatch(&message);
        if result.is_err() {
            self.state = ServerState::Failed;
        }
        result
    }

    fn handle_change_cipher_spec(&mut self) -> Result<RecordProtection> {
        if self.state != ServerState::WaitChangeCipherSpec {
            let state = self.state;
            self.state = ServerState::Failed;
            return Err(Error::UnexpectedMessage(format!(
                "ChangeCipherSpec in state {:?}",
                state
            )));
        }
        let provider = self.provider();
        let schedule = schedule_mut(&mut self.key_schedule)?;
        let protection = record_protection(provider.as_ref(), schedule, Role::Server, false)?;
        tracing::debug!("ChangeCipherSpec received");
        self.state = ServerState::WaitFinished;
        Ok(protection)
    }

    fn is_complete(&self) -> bool {
        self.is_connected()
    }

    fn negotiated_suite(&self) -> Option<CipherSuite> {
        self.key_schedule.as_ref().map(KeySchedule::suite)
    }

    fn session(&mut self) -> Result<NegotiatedSession> {
        let provider = self.provider();
        let server_name = self.server_name.clone();
        let chain = self.client_chain.clone();
        let schedule = schedule_mut(&mut self.key_schedule)?;
        NegotiatedSession::capture(Role::Server, provider.as_ref(), schedule, chain, server_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::certificate_validator::AcceptAnyCertificate;
    use crate::extensions::{elliptic_curves_extension, server_name_extension};
    use ironwire_certificates::{CertificateBuilder, KeyType};
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    fn certified(provider: &RustCryptoProvider, name: &str, key_type: KeyType) -> CertifiedKey {
        let cert = CertificateBuilder::server(name, key_type)
            .build_self_signed(provider)
            .expect("Failed to build certificate");
        CertifiedKey::new(vec![cert.der.clone()], cert.private_key.to_vec())
            .expect("Failed to load certificate")
    }

    fn server(keys: Vec<CertifiedKey>, client_auth: ClientAuth) -> ServerHandshake {
        let mut builder = ServerConfig::builder().with_provider(Arc::new(RustCryptoProvider::new()));
        for key in keys {
            builder = builder.add_certificate(key);
        }
        if client_auth != ClientAuth::None {
            builder = builder.with_client_auth(client_auth, Arc::new(AcceptAnyCertificate));
        }
        ServerHandshake::new(Arc::new(builder.build().expect("Failed to build config")))
    }

    fn client_hello(version: u16, suites: &[CipherSuite], extensions: Extensions) -> HandshakeMessage {
        let provider = RustCryptoProvider::new();
        let header = HelloHeader::generate(&provider, version).unwrap();
        let codes = suites.iter().map(|s| s.to_u16()).collect();
        let hello = ClientHello::new(header, codes, extensions);
        HandshakeMessage::new(HandshakeType::ClientHello, hello.encode().unwrap())
    }

    fn message_types(outputs: &[HandshakeOutput]) -> Vec<HandshakeType> {
        outputs
            .iter()
            .filter_map(|output| match output {
                HandshakeOutput::Message(message) => Some(message.msg_type),
                HandshakeOutput::ChangeCipherSpec(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_ecdhe_flight() {
        let provider = RustCryptoProvider::new();
        let mut server = server(
            vec![certified(&provider, "server.test", KeyType::EcdsaP256)],
            ClientAuth::None,
        );
        let mut extensions = Extensions::new();
        extensions.push(server_name_extension("server.test").unwrap());
        extensions.push(elliptic_curves_extension(&[KeyExchangeAlgorithm::Secp384r1]).unwrap());

        let outputs = server
            .handle_message(client_hello(
                0x0303,
                &[CipherSuite::EcdheEcdsaWithAes128GcmSha256],
                extensions,
            ))
            .unwrap();
        assert_eq!(
            message_types(&outputs),
            vec![
                HandshakeType::ServerHello,
                HandshakeType::Certificate,
                HandshakeType::ServerKeyExchange,
                HandshakeType::ServerHelloDone,
            ]
        );
        assert_eq!(server.server_name(), Some("server.test"));
        assert_eq!(server.state(), ServerState::WaitClientKeyExchange);

        let HandshakeOutput::Message(exchange) = &outputs[2] else {
            panic!("expected ServerKeyExchange");
        };
        let exchange = ServerKeyExchange::decode(&exchange.body).unwrap();
        assert_eq!(exchange.params.curve, KeyExchangeAlgorithm::Secp384r1);
    }

    #[test]
    fn test_client_preference_wins() {
        let provider = RustCryptoProvider::new();
        let mut server = server(
            vec![certified(&provider, "server.test", KeyType::EcdsaP256)],
            ClientAuth::None,
        );
        let a = CipherSuite::EcdheRsaWithAes256GcmSha384;
        let b = CipherSuite::EcdheEcdsaWithAes256GcmSha384;
        let c = CipherSuite::EcdheEcdsaWithAes128GcmSha256;
        server
            .handle_message(client_hello(0x0303, &[a, b, c], Extensions::new()))
            .unwrap();
        // no RSA certificate, so A is unusable and B is the first match
        assert_eq!(server.negotiated_suite(), Some(b));
    }

    #[test]
    fn test_no_certificate_for_suite() {
        let provider = RustCryptoProvider::new();
        let mut server = server(
            vec![certified(&provider, "server.test", KeyType::EcdsaP256)],
            ClientAuth::None,
        );
        let result = server.handle_message(client_hello(
            0x0303,
            &[CipherSuite::RsaWithAes128GcmSha256],
            Extensions::new(),
        ));
        assert!(matches!(result, Err(Error::Negotiation(msg)) if msg.contains("certificate")));
        assert_eq!(server.state(), ServerState::Failed);
    }

    #[test]
    fn test_old_client_version() {
        let provider = RustCryptoProvider::new();
        let mut server = server(
            vec![certified(&provider, "server.test", KeyType::EcdsaP256)],
            ClientAuth::None,
        );
        let result = server.handle_message(client_hello(
            0x0301,
            &[CipherSuite::EcdheEcdsaWithAes128GcmSha256],
            Extensions::new(),
        ));
        assert_eq!(result.unwrap_err(), Error::UnsupportedVersion(0x0301));
    }

    #[test]
    fn test_certificate_request_sent() {
        let provider = RustCryptoProvider::new();
        let mut server = server(
            vec![certified(&provider, "server.test", KeyType::EcdsaP256)],
            ClientAuth::Required,
        );
        let outputs = server
            .handle_message(client_hello(
                0x0303,
                &[CipherSuite::EcdheEcdsaWithAes128GcmSha256],
                Extensions::new(),
            ))
            .unwrap();
        assert!(message_types(&outputs).contains(&HandshakeType::CertificateRequest));
        assert_eq!(server.state(), ServerState::WaitClientCertificate);

        // an empty chain is refused in Required mode
        let empty = HandshakeMessage::new(
            HandshakeType::Certificate,
            Certificate::default().encode().unwrap(),
        );
        assert_eq!(
            server.handle_message(empty).unwrap_err(),
            Error::Verification(VerificationError::EmptyChain)
        );
    }

    #[test]
    fn test_finished_before_key_exchange() {
        let provider = RustCryptoProvider::new();
        let mut server = server(
            vec![certified(&provider, "server.test", KeyType::EcdsaP256)],
            ClientAuth::None,
        );
        server
            .handle_message(client_hello(
                0x0303,
                &[CipherSuite::EcdheEcdsaWithAes128GcmSha256],
                Extensions::new(),
            ))
            .unwrap();
        let finished = HandshakeMessage::new(HandshakeType::Finished, vec![0u8; 12]);
        assert!(matches!(
            server.handle_message(finished),
            Err(Error::UnexpectedMessage(_))
        ));
        assert!(server.handle_change_cipher_spec().is_err());
    }
}
