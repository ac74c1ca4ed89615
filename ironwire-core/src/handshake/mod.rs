//! TLS 1.2 handshake state machines.
//!
//! Both roles are sans-IO. The record layer feeds them reassembled handshake
//! messages and ChangeCipherSpec notifications and carries out the
//! [`HandshakeOutput`]s they return, in order:
//!
//! ```text
//!  record layer                       state machine
//!  ------------                       -------------
//!  start()                       -->  [ClientHello]                 (client)
//!  Handshake record -> message   -->  handle_message()  --> outputs
//!  ChangeCipherSpec record       -->  handle_change_cipher_spec()
//!                                <--  read-side RecordProtection
//!  outputs: Message(m)           -->  send m in a Handshake record
//!           ChangeCipherSpec(p)  -->  send CCS, protect later writes with p
//! ```
//!
//! The state machine owns the transcript. Every message it sends or receives
//! (HelloRequest aside) is recorded before it is acted on, so checks of a
//! received Finished or CertificateVerify trim exactly that message.

pub mod client;
pub mod server;

pub use client::{ClientHandshake, ClientState};
pub use server::{ServerHandshake, ServerState};

use crate::cipher_suites::CipherSuite;
use crate::error::{Error, Result};
use crate::handshake_io::HandshakeMessage;
use crate::key_schedule::{KeyMaterial, KeySchedule};
use crate::messages::Finished;
use crate::protocol::{HandshakeType, ProtocolVersion, Role};
use crate::record_protection::RecordProtection;
use crate::transcript::Transcript;
use ironwire_crypto::CryptoProvider;
use std::fmt;
use zeroize::Zeroizing;

/// Work the record layer must do for the handshake.
#[derive(Debug)]
pub enum HandshakeOutput {
    /// Send this message in a Handshake record
    Message(HandshakeMessage),
    /// Send ChangeCipherSpec, then protect every later record we write
    ChangeCipherSpec(RecordProtection),
}

/// A handshake in progress, as driven by the record layer.
pub trait Handshake: Send + fmt::Debug {
    /// Which side of the connection this is.
    fn role(&self) -> Role;

    /// First flight. Empty for servers, which wait for a ClientHello.
    fn start(&mut self) -> Result<Vec<HandshakeOutput>>;

    /// Process one handshake message from the peer.
    fn handle_message(&mut self, message: HandshakeMessage) -> Result<Vec<HandshakeOutput>>;

    /// The peer switched on its cipher. Returns the read-side protection.
    fn handle_change_cipher_spec(&mut self) -> Result<RecordProtection>;

    /// Whether both Finished messages have been exchanged and checked.
    fn is_complete(&self) -> bool;

    /// Suite chosen by the hellos, if any.
    fn negotiated_suite(&self) -> Option<CipherSuite>;

    /// Snapshot of the negotiated parameters. Fails before key exchange.
    fn session(&mut self) -> Result<NegotiatedSession>;
}

/// What a completed handshake agreed on.
#[derive(Clone)]
pub struct NegotiatedSession {
    /// Our side
    pub role: Role,
    /// Negotiated suite
    pub cipher_suite: CipherSuite,
    /// Protocol version
    pub version: ProtocolVersion,
    /// 48-byte master secret
    pub master_secret: Zeroizing<Vec<u8>>,
    /// Derived record keys
    pub key_material: KeyMaterial,
    /// Peer chain as received, leaf first (empty for an anonymous client)
    pub peer_certificates: Vec<Vec<u8>>,
    /// SNI name sent by the client
    pub server_name: Option<String>,
}

impl fmt::Debug for NegotiatedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiatedSession")
            .field("role", &self.role)
            .field("cipher_suite", &self.cipher_suite)
            .field("version", &self.version)
            .field("peer_certificates", &self.peer_certificates.len())
            .field("server_name", &self.server_name)
            .finish()
    }
}

impl NegotiatedSession {
    pub(crate) fn capture(
        role: Role,
        provider: &dyn CryptoProvider,
        schedule: &mut KeySchedule,
        peer_certificates: Vec<Vec<u8>>,
        server_name: Option<String>,
    ) -> Result<Self> {
        let key_material = schedule.key_material(provider)?.clone();
        Ok(Self {
            role,
            cipher_suite: schedule.suite(),
            version: ProtocolVersion::Tls12,
            master_secret: Zeroizing::new(schedule.master_secret()?.to_vec()),
            key_material,
            peer_certificates,
            server_name,
        })
    }
}

pub(crate) fn unexpected(state: impl fmt::Debug, msg_type: HandshakeType) -> Error {
    Error::UnexpectedMessage(format!("{:?} in state {:?}", msg_type, state))
}

/// Record `body` as a message of `msg_type` and queue it for sending.
pub(crate) fn send(
    transcript: &mut Transcript,
    outputs: &mut Vec<HandshakeOutput>,
    msg_type: HandshakeType,
    body: Vec<u8>,
) -> Result<()> {
    let message = HandshakeMessage::new(msg_type, body);
    transcript.record(&message)?;
    tracing::trace!("Queued {:?} ({} bytes)", msg_type, message.body.len());
    outputs.push(HandshakeOutput::Message(message));
    Ok(())
}

/// Our Finished body, over everything recorded so far.
pub(crate) fn finished_body(
    provider: &dyn CryptoProvider,
    schedule: &KeySchedule,
    transcript: &Transcript,
    sender: Role,
) -> Result<Vec<u8>> {
    let hash = transcript.hash(provider, schedule.suite().prf_hash(), 0)?;
    Finished::new(schedule.verify_data(provider, sender, &hash)?).encode()
}

/// Check a received Finished that is already the last recorded message.
pub(crate) fn verify_finished(
    provider: &dyn CryptoProvider,
    schedule: &KeySchedule,
    transcript: &Transcript,
    sender: Role,
    message: &HandshakeMessage,
) -> Result<()> {
    let finished = Finished::decode(&message.body)?;
    let hash = transcript.hash(
        provider,
        schedule.suite().prf_hash(),
        message.encoded_len(),
    )?;
    let expected = schedule.verify_data(provider, sender, &hash)?;
    finished.verify(&expected)
}

/// Record protection for `role` writing (`write = true`) or reading.
pub(crate) fn record_protection(
    provider: &dyn CryptoProvider,
    schedule: &mut KeySchedule,
    role: Role,
    write: bool,
) -> Result<RecordProtection> {
    let suite = schedule.suite();
    let material = schedule.key_material(provider)?;
    let keys = if write {
        material.write_keys(role)
    } else {
        material.read_keys(role)
    };
    Ok(RecordProtection::new(suite, keys.clone()))
}

pub(crate) fn schedule_mut(schedule: &mut Option<KeySchedule>) -> Result<&mut KeySchedule> {
    schedule
        .as_mut()
        .ok_or_else(|| Error::Internal("No cipher suite negotiated yet".into()))
}
