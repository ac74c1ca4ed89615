//! TLS 1.2 handshake benchmarks.
//!
//! This benchmark suite measures:
//! - Full handshakes over an in-memory transport, per key exchange
//! - ClientHello generation
//! - Master secret derivation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ironwire::{CertifiedKey, CipherSuite, ClientConfig, ServerConfig, TlsStream, TrustStore};
use ironwire_certificates::{CertificateBuilder, KeyType};
use ironwire_core::prf::compute_master_secret;
use ironwire_core::{ClientHandshake, Handshake};
use ironwire_crypto::HashAlgorithm;
use ironwire_crypto_rustcrypto::RustCryptoProvider;
use std::sync::Arc;

struct Fixture {
    client: Arc<ClientConfig>,
    server: Arc<ServerConfig>,
}

fn fixture(suite: CipherSuite, key_type: KeyType) -> Fixture {
    let provider = Arc::new(RustCryptoProvider::new());
    let ca = CertificateBuilder::ca("Bench Root", KeyType::EcdsaP256)
        .build_self_signed(provider.as_ref())
        .unwrap();
    let leaf = CertificateBuilder::server("bench.test", key_type)
        .build_signed_by(provider.as_ref(), &ca)
        .unwrap();
    let key = CertifiedKey::new(vec![leaf.der.clone(), ca.der.clone()], leaf.private_key.to_vec()).unwrap();

    let server = ServerConfig::builder()
        .with_provider(provider.clone())
        .add_certificate(key)
        .build()
        .unwrap();
    let client = ClientConfig::builder()
        .with_provider(provider)
        .with_trust_manager(Arc::new(TrustStore::from_roots([ca.der.as_slice()]).unwrap()))
        .with_cipher_suites(vec![suite])
        .with_server_name("bench.test")
        .build()
        .unwrap();

    Fixture {
        client: Arc::new(client),
        server: Arc::new(server),
    }
}

/// Benchmark full handshakes (ClientHello → both Finished verified)
fn benchmark_full_handshake(c: &mut Criterion) {
    let mut group = c.benchmark_group("tls12_full_handshake");
    group.sample_size(20);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let cases = [
        (CipherSuite::EcdheEcdsaWithAes128GcmSha256, KeyType::EcdsaP256),
        (CipherSuite::EcdheEcdsaWithAes256GcmSha384, KeyType::EcdsaP384),
        (CipherSuite::EcdheRsaWithAes128GcmSha256, KeyType::Rsa2048),
        (CipherSuite::RsaWithAes128GcmSha256, KeyType::Rsa2048),
    ];

    for (suite, key_type) in cases {
        let fixture = fixture(suite, key_type);
        group.bench_function(BenchmarkId::new("full", suite.name()), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
                    let (client, server) = tokio::join!(
                        TlsStream::connect(fixture.client.clone(), client_io),
                        TlsStream::accept(fixture.server.clone(), server_io)
                    );
                    black_box((client.unwrap(), server.unwrap()))
                })
            });
        });
    }

    group.finish();
}

/// Benchmark the pieces a handshake spends its time on
fn benchmark_handshake_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("tls12_steps");
    let fixture = fixture(CipherSuite::EcdheEcdsaWithAes128GcmSha256, KeyType::EcdsaP256);

    group.bench_function("client_hello", |b| {
        b.iter(|| {
            let mut client = ClientHandshake::new(fixture.client.clone());
            black_box(client.start().unwrap())
        });
    });

    let provider = RustCryptoProvider::new();
    let premaster = [0x03u8; 48];
    let client_random = [0x01u8; 32];
    let server_random = [0x02u8; 32];
    for hash in [HashAlgorithm::Sha256, HashAlgorithm::Sha384] {
        group.bench_function(BenchmarkId::new("master_secret", format!("{:?}", hash)), |b| {
            b.iter(|| {
                let master =
                    compute_master_secret(&provider, hash, black_box(&premaster), &client_random, &server_random)
                        .unwrap();
                black_box(master)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_full_handshake,
    benchmark_handshake_steps
);
criterion_main!(benches);
