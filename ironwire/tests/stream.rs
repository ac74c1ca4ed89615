//! TLS streams over in-memory tokio transports.

use ironwire::{
    Alert, AlertDescription, CertifiedKey, CipherSuite, ClientAuth, ClientConfig, Error,
    ServerConfig, TlsStream, TrustStore,
};
use ironwire_certificates::{CertificateBuilder, GeneratedCertificate, KeyType};
use ironwire_crypto_rustcrypto::RustCryptoProvider;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, DuplexStream};

const BUFFER: usize = 64 * 1024;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn certified(cert: &GeneratedCertificate, issuer: Option<&GeneratedCertificate>) -> CertifiedKey {
    let mut chain = vec![cert.der.clone()];
    chain.extend(issuer.map(|ca| ca.der.clone()));
    CertifiedKey::new(chain, cert.private_key.to_vec()).expect("Failed to load certificate")
}

struct Pki {
    provider: Arc<RustCryptoProvider>,
    ca: GeneratedCertificate,
    trust: Arc<TrustStore>,
}

impl Pki {
    fn new() -> Self {
        let provider = Arc::new(RustCryptoProvider::new());
        let ca = CertificateBuilder::ca("Stream Test Root", KeyType::EcdsaP256)
            .build_self_signed(provider.as_ref())
            .expect("Failed to build CA");
        let trust = Arc::new(TrustStore::from_roots([ca.der.as_slice()]).expect("Failed to load root"));
        Self { provider, ca, trust }
    }

    fn server_key(&self, key_type: KeyType) -> CertifiedKey {
        let cert = CertificateBuilder::server("stream.test", key_type)
            .build_signed_by(self.provider.as_ref(), &self.ca)
            .expect("Failed to build server certificate");
        certified(&cert, Some(&self.ca))
    }

    fn client_key(&self) -> CertifiedKey {
        let cert = CertificateBuilder::client("stream client", KeyType::EcdsaP256)
            .build_signed_by(self.provider.as_ref(), &self.ca)
            .expect("Failed to build client certificate");
        certified(&cert, None)
    }

    fn server(&self, key_type: KeyType) -> Arc<ServerConfig> {
        Arc::new(
            ServerConfig::builder()
                .with_provider(self.provider.clone())
                .add_certificate(self.server_key(key_type))
                .build()
                .expect("Failed to build server config"),
        )
    }

    fn client(&self, suites: Vec<CipherSuite>) -> Arc<ClientConfig> {
        Arc::new(
            ClientConfig::builder()
                .with_provider(self.provider.clone())
                .with_trust_manager(self.trust.clone())
                .with_cipher_suites(suites)
                .with_server_name("stream.test")
                .build()
                .expect("Failed to build client config"),
        )
    }
}

async fn handshake(
    client: Arc<ClientConfig>,
    server: Arc<ServerConfig>,
) -> (TlsStream<DuplexStream>, TlsStream<DuplexStream>) {
    let (client_io, server_io) = tokio::io::duplex(BUFFER);
    let (client, server) = tokio::join!(
        TlsStream::connect(client, client_io),
        TlsStream::accept(server, server_io)
    );
    (
        client.expect("Failed to connect"),
        server.expect("Failed to accept"),
    )
}

/// Next raw record from a peer that is not speaking TLS through us, or
/// `None` at end of stream.
async fn next_raw_record<R: AsyncRead + Unpin>(io: &mut R) -> Option<(u8, Vec<u8>)> {
    let mut header = [0u8; 5];
    io.read_exact(&mut header).await.ok()?;
    let mut payload = vec![0u8; u16::from_be_bytes([header[3], header[4]]) as usize];
    io.read_exact(&mut payload).await.ok()?;
    Some((header[0], payload))
}

async fn read_raw_record<R: AsyncRead + Unpin>(io: &mut R) -> (u8, Vec<u8>) {
    next_raw_record(io).await.expect("Missing record")
}

#[tokio::test]
async fn test_ecdhe_exchange_and_close() {
    init_tracing();
    let pki = Pki::new();
    let (mut client, mut server) = handshake(
        pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
        pki.server(KeyType::EcdsaP256),
    )
    .await;

    assert_eq!(client.cipher_suite(), CipherSuite::EcdheEcdsaWithAes128GcmSha256);
    assert_eq!(server.cipher_suite(), client.cipher_suite());
    assert_eq!(client.peer_certificates().len(), 2);
    assert!(server.peer_certificates().is_empty());
    assert_eq!(server.server_name(), Some("stream.test"));
    assert_eq!(
        client.session().master_secret.as_slice(),
        server.session().master_secret.as_slice()
    );

    client.write(b"ping").await.expect("Failed to write");
    let got = server.read().await.expect("Failed to read").expect("Missing data");
    assert_eq!(&got[..], b"ping");

    server.write(b"pong").await.expect("Failed to write");
    let got = client.read().await.expect("Failed to read").expect("Missing data");
    assert_eq!(&got[..], b"pong");

    client.close().await.expect("Failed to close");
    assert_eq!(server.read().await.expect("Failed to read"), None);
    // stays closed
    assert_eq!(server.read().await.expect("Failed to read"), None);
}

#[tokio::test]
async fn test_rsa_cbc_with_client_certificate() {
    init_tracing();
    let pki = Pki::new();
    let server = Arc::new(
        ServerConfig::builder()
            .with_provider(pki.provider.clone())
            .add_certificate(pki.server_key(KeyType::Rsa2048))
            .with_client_auth(ClientAuth::Required, pki.trust.clone())
            .build()
            .expect("Failed to build server config"),
    );
    let client = Arc::new(
        ClientConfig::builder()
            .with_provider(pki.provider.clone())
            .with_trust_manager(pki.trust.clone())
            .with_cipher_suites(vec![CipherSuite::RsaWithAes128CbcSha])
            .with_server_name("stream.test")
            .add_client_certificate(pki.client_key())
            .build()
            .expect("Failed to build client config"),
    );

    let (mut client, mut server) = handshake(client, server).await;
    assert_eq!(client.cipher_suite(), CipherSuite::RsaWithAes128CbcSha);
    assert_eq!(server.peer_certificates().len(), 1);

    server.write(b"over cbc").await.expect("Failed to write");
    let got = client.read().await.expect("Failed to read").expect("Missing data");
    assert_eq!(&got[..], b"over cbc");
}

#[tokio::test]
async fn test_large_write_arrives_in_fragments() {
    init_tracing();
    let pki = Pki::new();
    let (mut client, mut server) = handshake(
        pki.client(vec![CipherSuite::EcdheEcdsaWithAes256GcmSha384]),
        pki.server(KeyType::EcdsaP384),
    )
    .await;

    let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let write = async {
        client.write(&data).await.expect("Failed to write");
        client.close().await.expect("Failed to close");
    };
    let read = async {
        let mut received = Vec::new();
        let mut chunks = 0;
        while let Some(chunk) = server.read().await.expect("Failed to read") {
            assert!(chunk.len() <= 16384);
            received.extend_from_slice(&chunk);
            chunks += 1;
        }
        (received, chunks)
    };
    let ((), (received, chunks)) = tokio::join!(write, read);

    assert_eq!(received, data);
    assert_eq!(chunks, 7);
}

#[tokio::test]
async fn test_split_halves_work_from_separate_tasks() {
    init_tracing();
    let pki = Pki::new();
    let (client, mut server) = handshake(
        pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
        pki.server(KeyType::EcdsaP256),
    )
    .await;

    let (mut reader, mut writer) = client.into_split();
    let sender = tokio::spawn(async move {
        for i in 0..3u8 {
            writer.write(&[i; 10]).await.expect("Failed to write");
        }
        writer
    });

    for i in 0..3u8 {
        let got = server.read().await.expect("Failed to read").expect("Missing data");
        assert_eq!(&got[..], &[i; 10]);
        server.write(&[i]).await.expect("Failed to write");
        let echo = reader.read().await.expect("Failed to read").expect("Missing data");
        assert_eq!(&echo[..], &[i]);
    }

    let mut writer = sender.await.expect("Writer task panicked");
    writer.close().await.expect("Failed to close");
    assert_eq!(server.read().await.expect("Failed to read"), None);
}

#[tokio::test]
async fn test_no_common_suite_alerts_client() {
    init_tracing();
    let pki = Pki::new();
    let (client_io, server_io) = tokio::io::duplex(BUFFER);
    let (client, server) = tokio::join!(
        TlsStream::connect(
            pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
            client_io
        ),
        TlsStream::accept(pki.server(KeyType::Rsa2048), server_io)
    );

    assert!(matches!(server.unwrap_err(), Error::Negotiation(_)));
    assert_eq!(
        client.unwrap_err(),
        Error::AlertReceived(Alert::fatal(AlertDescription::HandshakeFailure))
    );
}

#[tokio::test]
async fn test_fatal_alert_aborts_handshake() {
    init_tracing();
    let pki = Pki::new();
    let (client_io, mut peer) = tokio::io::duplex(BUFFER);

    let fake_server = async {
        let (content_type, _) = read_raw_record(&mut peer).await;
        assert_eq!(content_type, 22);
        peer.write_all(&[21, 3, 3, 0, 2, 2, 40]).await.expect("Failed to write alert");
    };
    let (client, ()) = tokio::join!(
        TlsStream::connect(
            pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
            client_io
        ),
        fake_server
    );

    assert_eq!(
        client.unwrap_err(),
        Error::AlertReceived(Alert::fatal(AlertDescription::HandshakeFailure))
    );
}

#[tokio::test]
async fn test_oversized_record_rejected() {
    init_tracing();
    let pki = Pki::new();
    let (client_io, mut peer) = tokio::io::duplex(BUFFER);

    let fake_server = async {
        read_raw_record(&mut peer).await;
        // announces one byte past the limit and never sends the payload
        peer.write_all(&[22, 3, 3, 0x48, 0x01]).await.expect("Failed to write header");
        read_raw_record(&mut peer).await
    };
    let (client, alert) = tokio::join!(
        TlsStream::connect(
            pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
            client_io
        ),
        fake_server
    );

    assert_eq!(client.unwrap_err(), Error::RecordOverflow(0x4801));
    assert_eq!(alert, (21, vec![2, 22]));
}

#[tokio::test]
async fn test_handshake_timeout() {
    init_tracing();
    let pki = Pki::new();
    let config = Arc::new(
        ClientConfig::builder()
            .with_provider(pki.provider.clone())
            .with_trust_manager(pki.trust.clone())
            .with_server_name("stream.test")
            .with_handshake_timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build client config"),
    );

    // keeps the transport open without ever answering
    let (client_io, _silent) = tokio::io::duplex(BUFFER);
    let err = TlsStream::connect(config, client_io).await.unwrap_err();
    assert_eq!(err, Error::Timeout);
}

#[tokio::test]
async fn test_tampered_finished_is_bad_record_mac() {
    init_tracing();
    let pki = Pki::new();
    let (client_io, proxy_client) = tokio::io::duplex(BUFFER);
    let (proxy_server, server_io) = tokio::io::duplex(BUFFER);

    // Flips a bit in the client's first encrypted record, its Finished.
    let (mut from_client, mut to_client) = tokio::io::split(proxy_client);
    let (mut from_server, mut to_server) = tokio::io::split(proxy_server);
    tokio::spawn(async move {
        let mut after_ccs = false;
        while let Some((content_type, mut payload)) = next_raw_record(&mut from_client).await {
            if content_type == 22 && after_ccs {
                let last = payload.len() - 1;
                payload[last] ^= 0x01;
            }
            after_ccs |= content_type == 20;
            let mut record = vec![content_type, 3, 3];
            record.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            record.extend_from_slice(&payload);
            if to_server.write_all(&record).await.is_err() {
                break;
            }
        }
    });
    tokio::spawn(async move {
        let _ = tokio::io::copy(&mut from_server, &mut to_client).await;
    });

    let (client, server) = tokio::join!(
        TlsStream::connect(
            pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
            client_io
        ),
        TlsStream::accept(pki.server(KeyType::EcdsaP256), server_io)
    );

    assert_eq!(
        server.unwrap_err(),
        Error::Crypto(ironwire::ironwire_crypto::Error::AuthenticationFailed)
    );
    assert_eq!(
        client.unwrap_err(),
        Error::AlertReceived(Alert::fatal(AlertDescription::BadRecordMac))
    );
}

#[tokio::test]
async fn test_unlisted_alert_code_reaches_caller() {
    init_tracing();
    let pki = Pki::new();
    let (client_io, mut peer) = tokio::io::duplex(BUFFER);

    let fake_server = async {
        read_raw_record(&mut peer).await;
        // fatal unrecognized_name
        peer.write_all(&[21, 3, 3, 0, 2, 2, 112]).await.expect("Failed to write alert");
        next_raw_record(&mut peer).await
    };
    let (client, answer) = tokio::join!(
        TlsStream::connect(
            pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
            client_io
        ),
        fake_server
    );

    let err = client.unwrap_err();
    assert_eq!(err, Error::AlertReceived(Alert::fatal(AlertDescription::UnrecognizedName)));
    match err {
        Error::AlertReceived(alert) => assert_eq!(alert.encode(), [2, 112]),
        other => panic!("unexpected error {:?}", other),
    }
    // no decode_error back for an alert we merely do not name
    assert_eq!(answer, None);
}

#[tokio::test]
async fn test_dropped_stream_sends_close_notify() {
    init_tracing();
    let pki = Pki::new();
    let (client, mut server) = handshake(
        pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
        pki.server(KeyType::EcdsaP256),
    )
    .await;

    drop(client);
    assert_eq!(server.read().await.expect("Failed to read"), None);
}

#[tokio::test]
async fn test_dropped_writer_half_sends_close_notify() {
    init_tracing();
    let pki = Pki::new();
    let (client, mut server) = handshake(
        pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
        pki.server(KeyType::EcdsaP256),
    )
    .await;

    let (_reader, mut writer) = client.into_split();
    writer.write(b"last words").await.expect("Failed to write");
    drop(writer);

    let got = server.read().await.expect("Failed to read").expect("Missing data");
    assert_eq!(&got[..], b"last words");
    assert_eq!(server.read().await.expect("Failed to read"), None);
}

#[tokio::test]
async fn test_truncation_without_close_notify() {
    init_tracing();
    let pki = Pki::new();
    let (client_io, proxy_client) = tokio::io::duplex(BUFFER);
    let (proxy_server, server_io) = tokio::io::duplex(BUFFER);

    let (mut from_client, mut to_client) = tokio::io::split(proxy_client);
    let (mut from_server, mut to_server) = tokio::io::split(proxy_server);
    let upstream = tokio::spawn(async move {
        let _ = tokio::io::copy(&mut from_client, &mut to_server).await;
    });
    let downstream = tokio::spawn(async move {
        let _ = tokio::io::copy(&mut from_server, &mut to_client).await;
    });

    let (client, server) = tokio::join!(
        TlsStream::connect(
            pki.client(vec![CipherSuite::EcdheEcdsaWithAes128GcmSha256]),
            client_io
        ),
        TlsStream::accept(pki.server(KeyType::EcdsaP256), server_io)
    );
    let mut client = client.expect("Failed to connect");
    let _server = server.expect("Failed to accept");

    // the transport dies under both ends without any alert
    upstream.abort();
    downstream.abort();
    assert_eq!(client.read().await, Err(Error::Closed));
    assert_eq!(client.read().await, Err(Error::Closed));
}
