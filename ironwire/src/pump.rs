//! The record pump.
//!
//! A spawned task owns the read half. It demultiplexes records by content
//! type and hands the results to the connection through a bounded channel,
//! so a slow consumer stalls the transport instead of growing a buffer.
//!
//! ```text
//!  transport --read half--> [reader task] --Inbound--> handshake driver / TlsReader
//!                                ^                         |
//!                                +--- read protection -----+  (after peer CCS)
//!
//!  handshake driver / TlsWriter / TlsReader --lock--> [RecordWriter] --write half--> transport
//! ```
//!
//! When the peer's ChangeCipherSpec arrives the task stops reading until the
//! consumer sends back the read-side protection, so no record after the CCS
//! can be read in the clear.

use crate::record_io::{RecordReader, RecordWriter};
use bytes::Bytes;
use ironwire_core::alert::Alert;
use ironwire_core::handshake::HandshakeOutput;
use ironwire_core::handshake_io::{HandshakeMessage, HandshakeReassembler};
use ironwire_core::protocol::HandshakeType;
use ironwire_core::{ContentType, Error, RecordProtection, Result};
use ironwire_crypto::CryptoProvider;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

/// Records the reader task may queue ahead of its consumer.
const INBOUND_CAPACITY: usize = 32;

/// What the reader task delivers.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// One reassembled handshake message, never HelloRequest
    Handshake(HandshakeMessage),
    /// Peer switched ciphers. The reader resumes once the read-side
    /// protection is sent back.
    ChangeCipherSpec(oneshot::Sender<RecordProtection>),
    /// Decrypted application data, never empty
    ApplicationData(Bytes),
    /// Alert from the peer. The reader has stopped.
    Alert(Alert),
    /// Reading failed. The reader has stopped.
    Failed(Error),
}

/// Write half shared by everything that may put a record on the wire.
pub(crate) type SharedWriter<S> = Arc<Mutex<RecordWriter<WriteHalf<S>>>>;

/// Aborts the reader task when the last owner goes away.
#[derive(Debug)]
pub(crate) struct ReaderTask(JoinHandle<()>);

impl ReaderTask {
    pub(crate) fn abort(&self) {
        self.0.abort();
    }
}

impl Drop for ReaderTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Sends `close_notify` and shuts the writer down when dropped, unless the
/// writer was already shut down.
///
/// The work is spawned onto the current runtime; outside one it is skipped.
pub(crate) struct CloseOnDrop(Option<Pin<Box<dyn Future<Output = ()> + Send>>>);

impl CloseOnDrop {
    pub(crate) fn new<S>(writer: &SharedWriter<S>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let writer = Arc::clone(writer);
        Self(Some(Box::pin(async move {
            let mut writer = writer.lock().await;
            if writer.is_shut_down() {
                return;
            }
            match writer.send_alert(Alert::close_notify()).await {
                Ok(()) => tracing::debug!("Sent close_notify for dropped stream"),
                Err(e) => tracing::debug!("Could not send close_notify: {}", e),
            }
            if let Err(e) = writer.shutdown().await {
                tracing::debug!("Transport shutdown failed: {}", e);
            }
        })))
    }
}

impl std::fmt::Debug for CloseOnDrop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CloseOnDrop").field(&self.0.is_some()).finish()
    }
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        let Some(close) = self.0.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(close);
            },
            Err(_) => tracing::debug!("No runtime, dropping stream without close_notify"),
        }
    }
}

/// A transport split into the reader task and the shared writer.
#[derive(Debug)]
pub(crate) struct Pump<S> {
    pub(crate) inbound: mpsc::Receiver<Inbound>,
    pub(crate) writer: SharedWriter<S>,
    pub(crate) task: ReaderTask,
}

impl<S> Pump<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub(crate) fn start(stream: S, provider: Arc<dyn CryptoProvider>) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let (tx, inbound) = mpsc::channel(INBOUND_CAPACITY);

        let reader = InboundPump {
            reader: RecordReader::new(read_half),
            provider: provider.clone(),
            protection: None,
            reassembler: HandshakeReassembler::new(),
            tx,
        };
        let task = ReaderTask(tokio::spawn(reader.run()));

        Self {
            inbound,
            writer: Arc::new(Mutex::new(RecordWriter::new(write_half, provider))),
            task,
        }
    }

    /// Carry out handshake outputs in order, then flush.
    pub(crate) async fn send(&self, outputs: Vec<HandshakeOutput>) -> Result<()> {
        if outputs.is_empty() {
            return Ok(());
        }
        let mut writer = self.writer.lock().await;
        for output in outputs {
            match output {
                HandshakeOutput::Message(message) => {
                    writer.write(ContentType::Handshake, &message.encode()?).await?;
                },
                HandshakeOutput::ChangeCipherSpec(protection) => {
                    writer.change_cipher_spec(protection).await?;
                },
            }
        }
        writer.flush().await
    }

    /// Tear the connection down after `error`.
    pub(crate) async fn fail(&self, error: Error) -> Error {
        self.task.abort();
        abort_with(&self.writer, error).await
    }
}

/// Tell the peer about a locally detected failure, if there is an alert
/// for it, and shut the transport down. Returns `error` unchanged.
pub(crate) async fn abort_with<S>(writer: &SharedWriter<S>, error: Error) -> Error
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut writer = writer.lock().await;
    if let Some(description) = error.alert() {
        match writer.send_alert(Alert::fatal(description)).await {
            Ok(()) => tracing::debug!("Sent fatal {:?} alert", description),
            Err(e) => tracing::debug!("Could not send {:?} alert: {}", description, e),
        }
    }
    if let Err(e) = writer.shutdown().await {
        tracing::debug!("Transport shutdown failed: {}", e);
    }
    error
}

struct InboundPump<R> {
    reader: RecordReader<ReadHalf<R>>,
    provider: Arc<dyn CryptoProvider>,
    protection: Option<RecordProtection>,
    reassembler: HandshakeReassembler,
    tx: mpsc::Sender<Inbound>,
}

impl<R> InboundPump<R>
where
    R: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn run(mut self) {
        match self.pump().await {
            Ok(()) => tracing::trace!("Reader finished"),
            Err(e) => {
                tracing::debug!("Reader stopped: {}", e);
                // The consumer may already be gone.
                let _ = self.tx.send(Inbound::Failed(e)).await;
            },
        }
    }

    async fn pump(&mut self) -> Result<()> {
        loop {
            let record = self.reader.read_record().await?.ok_or(Error::Closed)?;
            let payload = match self.protection.as_mut() {
                Some(protection) => Bytes::from(protection.decrypt(
                    self.provider.as_ref(),
                    record.content_type,
                    record.version,
                    &record.payload,
                )?),
                None => record.payload,
            };

            match record.content_type {
                ContentType::Alert => {
                    let alert = Alert::decode(&payload)?;
                    tracing::debug!("Received {:?} {:?} alert", alert.level, alert.description);
                    self.deliver(Inbound::Alert(alert)).await?;
                    return Ok(());
                },
                ContentType::ChangeCipherSpec => {
                    if *payload != [1u8] {
                        return Err(Error::Framing("ChangeCipherSpec payload must be 0x01".into()));
                    }
                    if self.protection.is_some() {
                        return Err(Error::UnexpectedMessage("Second ChangeCipherSpec".into()));
                    }
                    if !self.reassembler.is_empty() {
                        return Err(Error::UnexpectedMessage(
                            "ChangeCipherSpec inside a fragmented handshake message".into(),
                        ));
                    }
                    let (gate, installed) = oneshot::channel();
                    self.deliver(Inbound::ChangeCipherSpec(gate)).await?;
                    match installed.await {
                        Ok(protection) => {
                            tracing::debug!("Read side switched to {:?}", protection.suite());
                            self.protection = Some(protection);
                        },
                        // handshake gave up
                        Err(_) => return Ok(()),
                    }
                },
                ContentType::Handshake => {
                    if payload.is_empty() {
                        return Err(Error::Framing("Empty handshake record".into()));
                    }
                    self.reassembler.push(&payload);
                    while let Some(message) = self.reassembler.next_message()? {
                        if message.msg_type == HandshakeType::HelloRequest {
                            tracing::debug!("Skipping HelloRequest, renegotiation is not supported");
                            continue;
                        }
                        self.deliver(Inbound::Handshake(message)).await?;
                    }
                },
                ContentType::ApplicationData => {
                    if self.protection.is_none() {
                        return Err(Error::UnexpectedMessage(
                            "Application data before ChangeCipherSpec".into(),
                        ));
                    }
                    if !payload.is_empty() {
                        self.deliver(Inbound::ApplicationData(payload)).await?;
                    }
                },
            }
        }
    }

    async fn deliver(&mut self, item: Inbound) -> Result<()> {
        self.tx.send(item).await.map_err(|_| Error::Closed)
    }
}
