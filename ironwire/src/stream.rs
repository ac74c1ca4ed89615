//! Async TLS stream.

use crate::pump::{abort_with, CloseOnDrop, Inbound, Pump, ReaderTask, SharedWriter};
use crate::{client, server};
use bytes::Bytes;
use ironwire_core::alert::Alert;
use ironwire_core::{
    CipherSuite, ClientConfig, ContentType, Error, NegotiatedSession, Result, ServerConfig,
};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

/// TLS connection over an async transport.
///
/// Created by [`TlsStream::connect`] or [`TlsStream::accept`], which return
/// once the handshake has completed. Application data is exchanged with
/// [`read`](TlsStream::read) and [`write`](TlsStream::write);
/// [`close`](TlsStream::close) sends `close_notify` and shuts the transport
/// down. Dropping the stream does the same in the background.
pub struct TlsStream<S> {
    reader: TlsReader<S>,
    writer: TlsWriter<S>,
    session: NegotiatedSession,
}

impl<S> fmt::Debug for TlsStream<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsStream").field("session", &self.session).finish()
    }
}

impl<S> TlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Connect to a server (client-side).
    ///
    /// SNI and hostname checks use `config.server_name`.
    pub async fn connect(config: Arc<ClientConfig>, stream: S) -> Result<Self> {
        client::connect(config, stream).await
    }

    /// Accept a connection (server-side).
    pub async fn accept(config: Arc<ServerConfig>, stream: S) -> Result<Self> {
        server::accept(config, stream).await
    }

    pub(crate) fn new(pump: Pump<S>, session: NegotiatedSession) -> Self {
        let Pump {
            inbound,
            writer,
            task,
        } = pump;
        Self {
            reader: TlsReader {
                inbound,
                writer: writer.clone(),
                _task: task,
                state: ReadState::Open,
            },
            writer: TlsWriter {
                _close: CloseOnDrop::new(&writer),
                writer,
            },
            session,
        }
    }

    /// Next chunk of application data.
    ///
    /// `Ok(None)` once the peer has sent `close_notify`.
    pub async fn read(&mut self) -> Result<Option<Bytes>> {
        self.reader.read().await
    }

    /// Send application data, fragmented into records as needed.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write(data).await
    }

    /// Send `close_notify` and shut the transport down.
    pub async fn close(&mut self) -> Result<()> {
        self.writer.close().await
    }

    /// Split into halves that can be used from different tasks.
    pub fn into_split(self) -> (TlsReader<S>, TlsWriter<S>) {
        (self.reader, self.writer)
    }
}

impl<S> TlsStream<S> {
    /// Negotiated cipher suite.
    pub fn cipher_suite(&self) -> CipherSuite {
        self.session.cipher_suite
    }

    /// Peer certificate chain, leaf first. Empty for a client that sent none.
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        &self.session.peer_certificates
    }

    /// Name the client asked for with SNI.
    pub fn server_name(&self) -> Option<&str> {
        self.session.server_name.as_deref()
    }

    /// Everything the handshake agreed on.
    pub fn session(&self) -> &NegotiatedSession {
        &self.session
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Open,
    /// Peer sent close_notify
    Closed,
    Failed,
}

/// Receiving half of a [`TlsStream`].
pub struct TlsReader<S> {
    inbound: mpsc::Receiver<Inbound>,
    // alerts for failures found while reading
    writer: SharedWriter<S>,
    _task: ReaderTask,
    state: ReadState,
}

impl<S> fmt::Debug for TlsReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsReader").field("state", &self.state).finish()
    }
}

impl<S> TlsReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Next chunk of application data.
    ///
    /// `Ok(None)` once the peer has sent `close_notify`. Any other alert
    /// fails with [`Error::AlertReceived`].
    pub async fn read(&mut self) -> Result<Option<Bytes>> {
        match self.state {
            ReadState::Open => {},
            ReadState::Closed => return Ok(None),
            ReadState::Failed => return Err(Error::Closed),
        }

        loop {
            let Some(event) = self.inbound.recv().await else {
                self.state = ReadState::Failed;
                return Err(Error::Closed);
            };
            match event {
                Inbound::ApplicationData(data) => return Ok(Some(data)),
                Inbound::Alert(alert) if alert.is_close_notify() => {
                    tracing::debug!("Peer closed the connection");
                    self.state = ReadState::Closed;
                    return Ok(None);
                },
                Inbound::Alert(alert) => {
                    self.state = ReadState::Failed;
                    return Err(Error::AlertReceived(alert));
                },
                Inbound::Handshake(message) => {
                    let error = Error::UnexpectedMessage(format!(
                        "{:?} after the handshake",
                        message.msg_type
                    ));
                    return Err(self.fail(error).await);
                },
                Inbound::ChangeCipherSpec(_) => {
                    let error =
                        Error::UnexpectedMessage("ChangeCipherSpec after the handshake".into());
                    return Err(self.fail(error).await);
                },
                Inbound::Failed(error) => return Err(self.fail(error).await),
            }
        }
    }

    async fn fail(&mut self, error: Error) -> Error {
        self.state = ReadState::Failed;
        abort_with(&self.writer, error).await
    }
}

/// Sending half of a [`TlsStream`].
///
/// Dropping it without [`close`](TlsWriter::close) still sends
/// `close_notify` from a spawned task, as long as a tokio runtime is running.
pub struct TlsWriter<S> {
    writer: SharedWriter<S>,
    _close: CloseOnDrop,
}

impl<S> fmt::Debug for TlsWriter<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsWriter").finish_non_exhaustive()
    }
}

impl<S> TlsWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Send application data, fragmented into records as needed.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write(ContentType::ApplicationData, data).await?;
        writer.flush().await
    }

    /// Send `close_notify` and shut the transport down.
    ///
    /// The alert is best effort; a peer that already hung up is not an error.
    pub async fn close(&mut self) -> Result<()> {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.send_alert(Alert::close_notify()).await {
            tracing::debug!("Could not send close_notify: {}", e);
        }
        writer.shutdown().await
    }
}
