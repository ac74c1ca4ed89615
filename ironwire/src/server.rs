//! Server-side connection setup.

use crate::handshake;
use crate::stream::TlsStream;
use ironwire_core::{Result, ServerConfig, ServerHandshake};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

/// Run a server handshake over `stream`.
///
/// Bounded by `config.handshake_timeout` when one is set.
pub async fn accept<S>(config: Arc<ServerConfig>, stream: S) -> Result<TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let provider = config.provider.clone();
    let deadline = config.handshake_timeout;
    handshake::run(ServerHandshake::new(config), stream, provider, deadline).await
}
