//! TLS 1.2 key exchange.
//!
//! Two ways of agreeing on the pre-master secret:
//!
//! - RSA: the client picks 48 random bytes, stamps the first two with the
//!   version it offered, and encrypts them to the server's certificate key
//!   with PKCS#1 v1.5.
//! - ECDHE: each side generates an ephemeral key pair on the negotiated
//!   curve; the pre-master secret is the ECDH shared X coordinate.

use crate::error::{Error, Result};
use crate::messages::EcPoint;
use crate::x509::PublicKeyInfo;
use ironwire_crypto::{
    CryptoProvider, EncryptionAlgorithm, KeyExchangeAlgorithm, KeyKind, PrivateKey,
};
use subtle::{ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

/// Length of an RSA pre-master secret.
pub const RSA_PREMASTER_SIZE: usize = 48;

/// Fresh RSA pre-master secret carrying `client_version` in its first two bytes.
pub fn rsa_premaster_secret(
    provider: &dyn CryptoProvider,
    client_version: u16,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut secret = Zeroizing::new(provider.random().generate(RSA_PREMASTER_SIZE)?);
    secret[..2].copy_from_slice(&client_version.to_be_bytes());
    Ok(secret)
}

/// Encrypt the pre-master secret to the server's RSA key.
pub fn rsa_encrypt_premaster(
    provider: &dyn CryptoProvider,
    server_key: &PublicKeyInfo,
    premaster: &[u8],
) -> Result<Vec<u8>> {
    if server_key.kind != KeyKind::Rsa {
        return Err(Error::Negotiation(
            "RSA key exchange needs an RSA server certificate".into(),
        ));
    }
    Ok(provider
        .encryption(EncryptionAlgorithm::RsaPkcs1v15)?
        .encrypt(&server_key.bytes, premaster)?)
}

/// Recover the pre-master secret from a ClientKeyExchange.
///
/// Any decryption, length or version failure yields a random secret instead
/// of an error (RFC 5246 Section 7.4.7.1). The handshake then fails at
/// Finished without revealing which check tripped.
pub fn rsa_decrypt_premaster(
    provider: &dyn CryptoProvider,
    private_key: &[u8],
    ciphertext: &[u8],
    client_version: u16,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut secret = Zeroizing::new(provider.random().generate(RSA_PREMASTER_SIZE)?);

    let decrypted = provider
        .encryption(EncryptionAlgorithm::RsaPkcs1v15)?
        .decrypt(private_key, ciphertext)
        .map(Zeroizing::new);

    match decrypted {
        Ok(candidate) if candidate.len() == RSA_PREMASTER_SIZE => {
            let version_ok = candidate[..2].ct_eq(&client_version.to_be_bytes());
            for (out, byte) in secret.iter_mut().zip(candidate.iter()) {
                out.conditional_assign(byte, version_ok);
            }
            if !bool::from(version_ok) {
                tracing::debug!("RSA pre-master secret carries the wrong version");
            }
        },
        Ok(_) | Err(_) => {
            tracing::debug!("RSA pre-master secret did not decrypt cleanly");
        },
    }
    Ok(secret)
}

/// Ephemeral ECDH key material for one handshake.
///
/// The private key is wiped when the pre-master secret is derived, because
/// [`EncryptionInfo::derive_premaster`] consumes `self`.
#[derive(Debug)]
pub struct EncryptionInfo {
    curve: KeyExchangeAlgorithm,
    private_key: PrivateKey,
    public_point: EcPoint,
}

impl EncryptionInfo {
    /// Generate an ephemeral key pair on `curve`.
    pub fn generate(provider: &dyn CryptoProvider, curve: KeyExchangeAlgorithm) -> Result<Self> {
        let (private_key, public_key) = provider.key_exchange(curve)?.generate_keypair()?;
        let public_point = EcPoint::from_uncompressed(curve, public_key.as_bytes())?;
        Ok(Self {
            curve,
            private_key,
            public_point,
        })
    }

    /// Curve of this key pair.
    pub fn curve(&self) -> KeyExchangeAlgorithm {
        self.curve
    }

    /// Our public point, as sent to the peer.
    pub fn public_point(&self) -> &EcPoint {
        &self.public_point
    }

    /// Run ECDH with the peer's point and drop our private key.
    pub fn derive_premaster(
        self,
        provider: &dyn CryptoProvider,
        peer: &EcPoint,
    ) -> Result<Zeroizing<Vec<u8>>> {
        if peer.curve() != self.curve {
            return Err(Error::Negotiation(format!(
                "Peer point on {} but we generated {}",
                peer.curve().name(),
                self.curve.name()
            )));
        }
        let shared = provider
            .key_exchange(self.curve)?
            .exchange(&self.private_key, peer.as_bytes())?;
        Ok(Zeroizing::new(shared.as_bytes().to_vec()))
    }
}
