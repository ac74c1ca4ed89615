//! Client-side connection setup.

use crate::handshake;
use crate::stream::TlsStream;
use ironwire_core::{ClientConfig, ClientHandshake, Result};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Run a client handshake over `stream`.
///
/// Bounded by `config.handshake_timeout` when one is set.
pub async fn connect<S>(config: Arc<ClientConfig>, stream: S) -> Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    tracing::debug!(
        "Connecting to {}",
        config.server_name.as_deref().unwrap_or("<unnamed server>")
    );
    let provider = config.provider.clone();
    let deadline = config.handshake_timeout;
    handshake::run(ClientHandshake::new(config), stream, provider, deadline).await
}
