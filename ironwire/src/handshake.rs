//! Drives a sans-IO handshake over the record pump.

use crate::pump::{Inbound, Pump};
use crate::stream::TlsStream;
use ironwire_core::{Error, Handshake, Result};
use ironwire_crypto::CryptoProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Run `handshake` to completion over `stream`.
///
/// On failure the peer is sent the matching fatal alert, when there is
/// one, and the transport is shut down.
pub(crate) async fn run<S, H>(
    mut handshake: H,
    stream: S,
    provider: Arc<dyn CryptoProvider>,
    deadline: Option<Duration>,
) -> Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    H: Handshake,
{
    let mut pump = Pump::start(stream, provider);

    let result = match deadline {
        Some(limit) => tokio::time::timeout(limit, drive(&mut handshake, &mut pump))
            .await
            .unwrap_or_else(|_| Err(Error::Timeout)),
        None => drive(&mut handshake, &mut pump).await,
    };
    if let Err(e) = result {
        tracing::warn!("{:?} handshake failed: {}", handshake.role(), e);
        return Err(pump.fail(e).await);
    }

    let session = match handshake.session() {
        Ok(session) => session,
        Err(e) => return Err(pump.fail(e).await),
    };
    tracing::debug!(
        "{:?} handshake complete: {:?}, {} peer certificate(s)",
        session.role,
        session.cipher_suite,
        session.peer_certificates.len()
    );
    Ok(TlsStream::new(pump, session))
}

async fn drive<S, H>(handshake: &mut H, pump: &mut Pump<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    H: Handshake,
{
    pump.send(handshake.start()?).await?;

    while !handshake.is_complete() {
        let event = pump.inbound.recv().await.ok_or(Error::Closed)?;
        match event {
            Inbound::Handshake(message) => {
                tracing::trace!("{:?} <- {:?}", handshake.role(), message.msg_type);
                let outputs = handshake.handle_message(message)?;
                pump.send(outputs).await?;
            },
            Inbound::ChangeCipherSpec(gate) => {
                let protection = handshake.handle_change_cipher_spec()?;
                gate.send(protection).map_err(|_| Error::Closed)?;
            },
            Inbound::ApplicationData(_) => {
                return Err(Error::UnexpectedMessage("Application data during handshake".into()));
            },
            Inbound::Alert(alert) if alert.is_close_notify() => return Err(Error::Closed),
            Inbound::Alert(alert) => return Err(Error::AlertReceived(alert)),
            Inbound::Failed(e) => return Err(e),
        }
    }
    Ok(())
}
