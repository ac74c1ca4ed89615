//! Record framing over an async transport.
//!
//! [`RecordReader`] pulls one record at a time off the read half, checking
//! the header before any payload is buffered. [`RecordWriter`] fragments,
//! protects and frames outgoing data on the write half.

use ironwire_core::alert::Alert;
use ironwire_core::record::{RecordHeader, TlsRecord, MAX_FRAGMENT_SIZE, RECORD_HEADER_SIZE};
use ironwire_core::{ContentType, Error, ProtocolVersion, RecordProtection, Result};
use ironwire_crypto::CryptoProvider;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Reads framed records.
#[derive(Debug)]
pub(crate) struct RecordReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> RecordReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next record, or `None` when the transport ends on a record boundary.
    pub(crate) async fn read_record(&mut self) -> Result<Option<TlsRecord>> {
        let mut raw = [0u8; RECORD_HEADER_SIZE];
        if self.inner.read(&mut raw[..1]).await? == 0 {
            return Ok(None);
        }
        self.read_fully(&mut raw[1..], "Record header truncated").await?;

        let header = RecordHeader::decode(&raw)?;
        let mut payload = vec![0u8; header.length];
        self.read_fully(&mut payload, "Record payload truncated").await?;

        tracing::trace!("Read {:?} record ({} bytes)", header.content_type, header.length);
        Ok(Some(TlsRecord::new(header.content_type, header.version, payload)))
    }

    async fn read_fully(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        match self.inner.read_exact(buf).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(Error::Framing(what.to_string()))
            },
            Err(e) => Err(e.into()),
        }
    }
}

/// Writes framed records, protecting them once a cipher is installed.
pub(crate) struct RecordWriter<W> {
    inner: W,
    provider: Arc<dyn CryptoProvider>,
    protection: Option<RecordProtection>,
    shut_down: bool,
}

impl<W> std::fmt::Debug for RecordWriter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordWriter")
            .field("protection", &self.protection)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl<W: AsyncWrite + Unpin> RecordWriter<W> {
    pub(crate) fn new(inner: W, provider: Arc<dyn CryptoProvider>) -> Self {
        Self {
            inner,
            provider,
            protection: None,
            shut_down: false,
        }
    }

    /// Write `data` as one or more records of `content_type`.
    ///
    /// Does not flush.
    pub(crate) async fn write(&mut self, content_type: ContentType, data: &[u8]) -> Result<()> {
        if self.shut_down {
            return Err(Error::Closed);
        }
        for fragment in data.chunks(MAX_FRAGMENT_SIZE) {
            let payload = match self.protection.as_mut() {
                Some(protection) => protection.encrypt(
                    self.provider.as_ref(),
                    content_type,
                    ProtocolVersion::Tls12,
                    fragment,
                )?,
                None => fragment.to_vec(),
            };
            let record = TlsRecord::new(content_type, ProtocolVersion::Tls12, payload).encode()?;
            self.inner.write_all(&record).await?;
            tracing::trace!("Wrote {:?} record ({} bytes)", content_type, record.len());
        }
        Ok(())
    }

    /// Send ChangeCipherSpec and protect everything written after it.
    pub(crate) async fn change_cipher_spec(&mut self, protection: RecordProtection) -> Result<()> {
        self.write(ContentType::ChangeCipherSpec, &[1]).await?;
        tracing::debug!("Write side switched to {:?}", protection.suite());
        self.protection = Some(protection);
        Ok(())
    }

    /// Write and flush a single alert.
    pub(crate) async fn send_alert(&mut self, alert: Alert) -> Result<()> {
        self.write(ContentType::Alert, &alert.encode()).await?;
        self.flush().await
    }

    pub(crate) async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await?;
        Ok(())
    }

    pub(crate) fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Shut the transport down. Later writes fail with `Error::Closed`.
    pub(crate) async fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    fn provider() -> Arc<dyn CryptoProvider> {
        Arc::new(RustCryptoProvider::new())
    }

    #[tokio::test]
    async fn test_large_write_is_fragmented() {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let mut writer = RecordWriter::new(a, provider());
        let mut reader = RecordReader::new(b);

        let data = vec![0x42u8; MAX_FRAGMENT_SIZE + 100];
        let write = async {
            writer.write(ContentType::ApplicationData, &data).await.expect("Failed to write");
            writer.flush().await.expect("Failed to flush");
        };
        let read = async {
            let first = reader.read_record().await.expect("Failed to read").expect("Missing record");
            let second = reader.read_record().await.expect("Failed to read").expect("Missing record");
            (first, second)
        };
        let ((), (first, second)) = tokio::join!(write, read);

        assert_eq!(first.payload.len(), MAX_FRAGMENT_SIZE);
        assert_eq!(second.payload.len(), 100);
        assert_eq!(second.content_type, ContentType::ApplicationData);
    }

    #[tokio::test]
    async fn test_oversized_header_rejected_before_payload() {
        let (mut a, b) = tokio::io::duplex(1024);
        let mut reader = RecordReader::new(b);

        // No payload follows; the header alone must be enough to fail.
        a.write_all(&[22, 3, 3, 0x48, 0x01]).await.expect("Failed to write");

        let err = reader.read_record().await.unwrap_err();
        assert_eq!(err, Error::RecordOverflow(0x4801));
    }

    #[tokio::test]
    async fn test_clean_and_truncated_eof() {
        let (a, b) = tokio::io::duplex(1024);
        drop(a);
        let mut reader = RecordReader::new(b);
        assert!(reader.read_record().await.expect("Failed to read").is_none());

        let (mut a, b) = tokio::io::duplex(1024);
        a.write_all(&[23, 3, 3, 0, 10, 1, 2]).await.expect("Failed to write");
        drop(a);
        let mut reader = RecordReader::new(b);
        assert!(matches!(reader.read_record().await, Err(Error::Framing(_))));
    }

    #[tokio::test]
    async fn test_writes_fail_after_shutdown() {
        let (a, _b) = tokio::io::duplex(1024);
        let mut writer = RecordWriter::new(a, provider());
        writer.shutdown().await.expect("Failed to shut down");
        assert_eq!(writer.write(ContentType::ApplicationData, b"x").await, Err(Error::Closed));
    }
}
