//! TLS 1.2 Client Handshake State Machine
//!
//! Implements the client side of a full TLS 1.2 handshake per RFC 5246.
//!
//! ## State Transitions
//! ```text
//! START
//!   | send ClientHello
//!   v
//! WAIT_SERVER_HELLO
//!   | recv ServerHello
//!   v
//! WAIT_CERTIFICATE
//!   | recv Certificate
//!   v
//! WAIT_SERVER_KEY_EXCHANGE          (ECDHE suites only)
//!   | recv ServerKeyExchange
//!   v
//! WAIT_SERVER_HELLO_DONE
//!   | recv CertificateRequest       (optional)
//!   | recv ServerHelloDone
//!   | send Certificate              (if requested)
//!   | send ClientKeyExchange
//!   | send CertificateVerify        (if a certificate was sent)
//!   | send ChangeCipherSpec
//!   | send Finished
//!   v
//! WAIT_CHANGE_CIPHER_SPEC
//!   | recv ChangeCipherSpec
//!   v
//! WAIT_FINISHED
//!   | recv Finished
//!   v
//! CONNECTED
//! ```

use super::{
    finished_body, record_protection, schedule_mut, send, unexpected, verify_finished,
    Handshake, HandshakeOutput, NegotiatedSession,
};
use crate::certificate_validator::{parse_chain, unix_now};
use crate::cipher_suites::{CipherSuite, KeyExchangeKind};
use crate::config::{CertifiedKey, ClientConfig};
use crate::error::{Error, Result, VerificationError};
use crate::extensions::{
    ec_point_formats_extension, elliptic_curves_extension, server_name_extension,
    signature_algorithms_extension, Extensions, POINT_FORMAT_UNCOMPRESSED,
};
use crate::handshake_io::HandshakeMessage;
use crate::hostname::verify_hostname;
use crate::key_exchange::{rsa_encrypt_premaster, rsa_premaster_secret, EncryptionInfo};
use crate::key_schedule::KeySchedule;
use crate::messages::{
    client_hello::COMPRESSION_NULL, expect_empty, Certificate, CertificateInfo,
    CertificateVerify, ClientHello, ClientKeyExchange, EcParameters, HelloHeader, ServerHello,
    ServerKeyExchange,
};
use crate::protocol::{HandshakeType, ProtocolVersion, Role, RANDOM_SIZE};
use crate::record_protection::RecordProtection;
use crate::transcript::Transcript;
use crate::x509::PeerCertificate;
use std::net::IpAddr;
use std::sync::Arc;

/// TLS 1.2 client handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Initial state, ready to send ClientHello
    Start,
    /// Waiting for ServerHello
    WaitServerHello,
    /// Waiting for the server Certificate
    WaitCertificate,
    /// Waiting for ServerKeyExchange (ECDHE)
    WaitServerKeyExchange,
    /// Waiting for CertificateRequest or ServerHelloDone
    WaitServerHelloDone,
    /// Our flight is out, waiting for the server's ChangeCipherSpec
    WaitChangeCipherSpec,
    /// Waiting for the server Finished
    WaitFinished,
    /// Handshake complete, connection established
    Connected,
    /// Error state
    Failed,
}

/// TLS 1.2 client handshake context.
pub struct ClientHandshake {
    config: Arc<ClientConfig>,
    state: ClientState,
    transcript: Transcript,
    client_random: [u8; RANDOM_SIZE],
    server_random: [u8; RANDOM_SIZE],
    key_schedule: Option<KeySchedule>,
    server_chain: Vec<Vec<u8>>,
    server_leaf: Option<PeerCertificate>,
    server_params: Option<EcParameters>,
    certificate_request: Option<CertificateInfo>,
}

impl std::fmt::Debug for ClientHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientHandshake")
            .field("state", &self.state)
            .field("suite", &self.negotiated_suite())
            .field("transcript_len", &self.transcript.len())
            .finish()
    }
}

impl ClientHandshake {
    /// Create a new client handshake.
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            state: ClientState::Start,
            transcript: Transcript::new(),
            client_random: [0u8; RANDOM_SIZE],
            server_random: [0u8; RANDOM_SIZE],
            key_schedule: None,
            server_chain: Vec::new(),
            server_leaf: None,
            server_params: None,
            certificate_request: None,
        }
    }

    /// Get the current state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Check if handshake is complete.
    pub fn is_connected(&self) -> bool {
        self.state == ClientState::Connected
    }

    /// The transcript so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    fn provider(&self) -> Arc<dyn ironwire_crypto::CryptoProvider> {
        Arc::clone(&self.config.provider)
    }

    fn suite(&self) -> Result<CipherSuite> {
        self.negotiated_suite()
            .ok_or_else(|| Error::Internal("No cipher suite negotiated yet".into()))
    }

    fn client_hello(&mut self) -> Result<ClientHello> {
        let provider = self.provider();
        let header = HelloHeader::generate(provider.as_ref(), ProtocolVersion::Tls12.to_u16())?;
        self.client_random = header.random;

        let mut extensions = Extensions::new();
        if let Some(name) = &self.config.server_name {
            // SNI carries host names only
            if name.parse::<IpAddr>().is_err() {
                extensions.push(server_name_extension(name)?);
            }
        }
        extensions.push(signature_algorithms_extension(&self.config.signature_algorithms)?);

        let offers_ecdhe = self
            .config
            .cipher_suites
            .iter()
            .any(|suite| suite.key_exchange() == KeyExchangeKind::Ecdhe);
        if offers_ecdhe && !self.config.curves.is_empty() {
            extensions.push(elliptic_curves_extension(&self.config.curves)?);
            extensions.push(ec_point_formats_extension()?);
        }

        let suites = self.config.cipher_suites.iter().map(|s| s.to_u16()).collect();
        Ok(ClientHello::new(header, suites, extensions))
    }

    fn process_server_hello(&mut self, body: &[u8]) -> Result<()> {
        let hello = ServerHello::decode(body)?;

        if hello.header.version != ProtocolVersion::Tls12.to_u16() {
            return Err(Error::UnsupportedVersion(hello.header.version));
        }
        if hello.compression_method != COMPRESSION_NULL {
            return Err(Error::Negotiation(format!(
                "Server selected compression method {}",
                hello.compression_method
            )));
        }

        let suite = CipherSuite::from_u16(hello.cipher_suite)
            .filter(|suite| self.config.cipher_suites.contains(suite))
            .ok_or_else(|| {
                Error::Negotiation(format!(
                    "Server selected cipher suite 0x{:04x}, which was not offered",
                    hello.cipher_suite
                ))
            })?;

        let candidates: Vec<_> = self
            .config
            .signature_algorithms
            .iter()
            .copied()
            .filter(|alg| alg.key_kind() == suite.signature_kind())
            .collect();
        if candidates.is_empty() {
            return Err(Error::Negotiation(format!(
                "No signature algorithm usable with {}",
                suite.name()
            )));
        }
        if let Some(server_algs) = hello.extensions.signature_algorithms()? {
            if !candidates.iter().any(|alg| server_algs.contains(alg)) {
                return Err(Error::Negotiation(format!(
                    "No signature algorithms in common for {}",
                    suite.name()
                )));
            }
        }
        if let Some(formats) = hello.extensions.ec_point_formats()? {
            if !formats.contains(&POINT_FORMAT_UNCOMPRESSED) {
                return Err(Error::Negotiation(
                    "Server does not accept uncompressed points".into(),
                ));
            }
        }

        self.server_random = hello.header.random;
        self.key_schedule = Some(KeySchedule::new(
            suite,
            self.client_random,
            self.server_random,
        ));
        tracing::debug!("Negotiated {}", suite.name());
        self.state = ClientState::WaitCertificate;
        Ok(())
    }

    fn process_certificate(&mut self, body: &[u8]) -> Result<()> {
        let suite = self.suite()?;
        let certificate = Certificate::decode(body)?;
        if certificate.is_empty() {
            return Err(VerificationError::EmptyChain.into());
        }

        let chain = parse_chain(&certificate.chain)?;
        self.config
            .trust_manager
            .verify_chain(self.config.provider.as_ref(), &chain, unix_now())?;

        let leaf = chain
            .into_iter()
            .next()
            .ok_or(VerificationError::EmptyChain)?;
        if leaf.public_key().kind != suite.signature_kind() {
            return Err(VerificationError::UnsupportedCertificate(format!(
                "{} key cannot authenticate {}",
                leaf.public_key().kind.name(),
                suite.name()
            ))
            .into());
        }
        if let Some(name) = &self.config.server_name {
            verify_hostname(name, &leaf)?;
        }

        self.server_chain = certificate.chain;
        self.server_leaf = Some(leaf);
        self.state = match suite.key_exchange() {
            KeyExchangeKind::Ecdhe => ClientState::WaitServerKeyExchange,
            KeyExchangeKind::Rsa => ClientState::WaitServerHelloDone,
        };
        Ok(())
    }

    fn process_server_key_exchange(&mut self, body: &[u8]) -> Result<()> {
        let exchange = ServerKeyExchange::decode(body)?;
        let curve = exchange.params.curve;
        if !self.config.curves.contains(&curve) {
            return Err(Error::Negotiation(format!(
                "Server picked curve {}, which was not offered",
                curve.name()
            )));
        }
        if !self
            .config
            .signature_algorithms
            .contains(&exchange.signature_algorithm)
        {
            return Err(Error::Negotiation(format!(
                "Server signed with {}, which was not offered",
                exchange.signature_algorithm.name()
            )));
        }

        let leaf = self
            .server_leaf
            .as_ref()
            .ok_or_else(|| Error::Internal("ServerKeyExchange before Certificate".into()))?;
        let signed =
            ServerKeyExchange::signed_data(&self.client_random, &self.server_random, &exchange.params)?;
        leaf.verify_signature(
            self.config.provider.as_ref(),
            exchange.signature_algorithm,
            &signed,
            &exchange.signature,
        )?;
        tracing::debug!("ServerKeyExchange signature verified on {}", curve.name());

        self.server_params = Some(exchange.params);
        self.state = ClientState::WaitServerHelloDone;
        Ok(())
    }

    fn process_certificate_request(&mut self, body: &[u8]) -> Result<()> {
        let info = CertificateInfo::decode(body)?;
        tracing::debug!(
            "Server requested a client certificate ({} authorities)",
            info.authorities.len()
        );
        self.certificate_request = Some(info);
        Ok(())
    }

    fn select_client_certificate(&self, info: &CertificateInfo) -> Option<CertifiedKey> {
        self.config
            .client_certificates
            .iter()
            .find(|key| info.accepts_key(key.key_kind()) && info.accepts_issuer(key.leaf().issuer()))
            .cloned()
    }

    fn process_server_hello_done(&mut self, body: &[u8]) -> Result<Vec<HandshakeOutput>> {
        expect_empty(body, "ServerHelloDone")?;
        let provider = self.provider();
        let suite = self.suite()?;
        let mut outputs = Vec::new();

        let client_key = match self.certificate_request.take() {
            Some(info) => {
                let chosen = self.select_client_certificate(&info);
                let chain = chosen.as_ref().map(|k| k.chain.clone()).unwrap_or_default();
                if chosen.is_none() {
                    tracing::warn!("No suitable client certificate, sending an empty chain");
                }
                send(
                    &mut self.transcript,
                    &mut outputs,
                    HandshakeType::Certificate,
                    Certificate::new(chain).encode()?,
                )?;
                chosen.map(|key| (key, info))
            },
            None => None,
        };

        let (exchange, premaster) = match suite.key_exchange() {
            KeyExchangeKind::Rsa => {
                let leaf = self
                    .server_leaf
                    .as_ref()
                    .ok_or_else(|| Error::Internal("No server certificate".into()))?;
                let premaster =
                    rsa_premaster_secret(provider.as_ref(), ProtocolVersion::Tls12.to_u16())?;
                let ciphertext =
                    rsa_encrypt_premaster(provider.as_ref(), leaf.public_key(), &premaster)?;
                (ClientKeyExchange::Rsa(ciphertext), premaster)
            },
            KeyExchangeKind::Ecdhe => {
                let params = self.server_params.take().ok_or_else(|| {
                    Error::UnexpectedMessage("ServerHelloDone without ServerKeyExchange".into())
                })?;
                let info = EncryptionInfo::generate(provider.as_ref(), params.curve)?;
                let point = info.public_point().clone();
                let premaster = info.derive_premaster(provider.as_ref(), &params.point)?;
                (ClientKeyExchange::Ecdhe(point), premaster)
            },
        };
        send(
            &mut self.transcript,
            &mut outputs,
            HandshakeType::ClientKeyExchange,
            exchange.encode()?,
        )?;

        let schedule = schedule_mut(&mut self.key_schedule)?;
        schedule.derive_master_secret(provider.as_ref(), premaster)?;

        if let Some((key, info)) = client_key {
            let offered = (!info.signature_algorithms.is_empty())
                .then_some(info.signature_algorithms.as_slice());
            let algorithm = key
                .choose_signature_algorithm(&self.config.signature_algorithms, offered)
                .ok_or_else(|| {
                    Error::Negotiation("No signature algorithm for the client certificate".into())
                })?;
            let signature = provider
                .signature(algorithm)?
                .sign(&key.private_key, self.transcript.as_bytes())?;
            send(
                &mut self.transcript,
                &mut outputs,
                HandshakeType::CertificateVerify,
                CertificateVerify::new(algorithm, signature).encode()?,
            )?;
        }

        let schedule = schedule_mut(&mut self.key_schedule)?;
        let protection = record_protection(provider.as_ref(), schedule, Role::Client, true)?;
        outputs.push(HandshakeOutput::ChangeCipherSpec(protection));
        tracing::debug!("ChangeCipherSpec sent");

        let body = finished_body(provider.as_ref(), schedule, &self.transcript, Role::Client)?;
        send(&mut self.transcript, &mut outputs, HandshakeType::Finished, body)?;

        self.state = ClientState::WaitChangeCipherSpec;
        Ok(outputs)
    }

    fn process_server_finished(&mut self, message: &HandshakeMessage) -> Result<()> {
        let provider = self.provider();
        let schedule = schedule_mut(&mut self.key_schedule)?;
        verify_finished(
            provider.as_ref(),
            schedule,
            &self.transcript,
            Role::Server,
            message,
        )?;
        self.state = ClientState::Connected;
        tracing::debug!("Client handshake completed with {}", schedule.suite().name());
        Ok(())
    }

    fn dispatch(&mut self, message: &HandshakeMessage) -> Result<Vec<HandshakeOutput>> {
        match (self.state, message.msg_type) {
            (ClientState::WaitServerHello, HandshakeType::ServerHello) => {
                self.process_server_hello(&message.body)?;
            },
            (ClientState::WaitCertificate, HandshakeType::Certificate) => {
                self.process_certificate(&message.body)?;
            },
            (ClientState::WaitServerKeyExchange, HandshakeType::ServerKeyExchange) => {
                self.process_server_key_exchange(&message.body)?;
            },
            (ClientState::WaitServerHelloDone, HandshakeType::CertificateRequest)
                if self.certificate_request.is_none() =>
            {
                self.process_certificate_request(&message.body)?;
            },
            (ClientState::WaitServerHelloDone, HandshakeType::ServerHelloDone) => {
                return self.process_server_hello_done(&message.body);
            },
            (ClientState::WaitFinished, HandshakeType::Finished) => {
                self.process_server_finished(message)?;
            },
            (state, msg_type) => return Err(unexpected(state, msg_type)),
        }
        Ok(Vec::new())
    }
}

impl Handshake for ClientHandshake {
    fn role(&self) -> Role {
        Role::Client
    }

    fn start(&mut self) -> Result<Vec<HandshakeOutput>> {
        if self.state != ClientState::Start {
            return Err(Error::Internal("Client handshake already started".into()));
        }
        let hello = self.client_hello()?;
        let mut outputs = Vec::new();
        send(
            &mut self.transcript,
            &mut outputs,
            HandshakeType::ClientHello,
            hello.encode()?,
        )?;
        tracing::debug!("ClientHello sent offering {} suites", hello.cipher_suites.len());
        self.state = ClientState::WaitServerHello;
        Ok(outputs)
    }

    fn handle_message(&mut self, message: HandshakeMessage) -> Result<Vec<HandshakeOutput>> {
        if message.msg_type == HandshakeType::HelloRequest {
            tracing::debug!("Ignoring HelloRequest");
            return Ok(Vec::new());
        }
        self.transcript.record(&message)?;
        let result = self.dispatch(&message);
        if result.is_err() {
            self.state = ClientState::Failed;
        }
        result
    }

    fn handle_change_cipher_spec(&mut self) -> Result<RecordProtection> {
        if self.state != ClientState::WaitChangeCipherSpec {
            let state = self.state;
            self.state = ClientState::Failed;
            return Err(Error::UnexpectedMessage(format!(
                "ChangeCipherSpec in state {:?}",
                state
            )));
        }
        let provider = self.provider();
        let schedule = schedule_mut(&mut self.key_schedule)?;
        let protection = record_protection(provider.as_ref(), schedule, Role::Client, false)?;
        tracing::debug!("ChangeCipherSpec received");
        self.state = ClientState::WaitFinished;
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
        let server_name = self.config.server_name.clone();
        let chain = self.server_chain.clone();
        let schedule = schedule_mut(&mut self.key_schedule)?;
        NegotiatedSession::capture(Role::Client, provider.as_ref(), schedule, chain, server_name)
    }
}
