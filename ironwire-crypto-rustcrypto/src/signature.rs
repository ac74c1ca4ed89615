//! Digital signature implementations using `rsa`, `p256` and `p384`.
//!
//! ECDSA signs a prehashed message so any hash of the TLS 1.2 signature
//! pair can be combined with either curve. The curve is chosen from the
//! key length.

use ironwire_crypto::signature::{SigningKey, VerifyingKey};
use ironwire_crypto::{Error, HashAlgorithm, KeyKind, Result, Signature, SignatureAlgorithm};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs1v15;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Digest;

/// Modulus size for generated RSA keys.
pub const RSA_KEY_BITS: usize = 2048;

/// Create a signature instance for the specified algorithm.
pub fn create_signature(algorithm: SignatureAlgorithm) -> Result<Box<dyn Signature>> {
    match algorithm.key_kind() {
        KeyKind::Rsa => Ok(Box::new(RsaPkcs1 { algorithm })),
        KeyKind::Ec => Ok(Box::new(Ecdsa { algorithm })),
    }
}

fn prehash(algorithm: HashAlgorithm, message: &[u8]) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha1 => sha1::Sha1::digest(message).to_vec(),
        HashAlgorithm::Sha256 => sha2::Sha256::digest(message).to_vec(),
        HashAlgorithm::Sha384 => sha2::Sha384::digest(message).to_vec(),
        HashAlgorithm::Sha512 => sha2::Sha512::digest(message).to_vec(),
    }
}

/// RSASSA-PKCS1-v1_5.
#[derive(Debug)]
struct RsaPkcs1 {
    algorithm: SignatureAlgorithm,
}

impl Signature for RsaPkcs1 {
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        let key = RsaPrivateKey::from_pkcs1_der(signing_key).map_err(|_| Error::InvalidPrivateKey)?;

        let signature = match self.algorithm.hash() {
            HashAlgorithm::Sha1 => pkcs1v15::SigningKey::<sha1::Sha1>::new(key).try_sign(message),
            HashAlgorithm::Sha256 => {
                pkcs1v15::SigningKey::<sha2::Sha256>::new(key).try_sign(message)
            },
            HashAlgorithm::Sha384 => {
                pkcs1v15::SigningKey::<sha2::Sha384>::new(key).try_sign(message)
            },
            HashAlgorithm::Sha512 => {
                pkcs1v15::SigningKey::<sha2::Sha512>::new(key).try_sign(message)
            },
        }
        .map_err(|e| Error::backend("RSA signing", e))?;

        Ok(signature.to_vec())
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let key = RsaPublicKey::from_pkcs1_der(verifying_key).map_err(|_| Error::InvalidPublicKey)?;
        let signature =
            pkcs1v15::Signature::try_from(signature).map_err(|_| Error::InvalidSignature)?;

        match self.algorithm.hash() {
            HashAlgorithm::Sha1 => {
                pkcs1v15::VerifyingKey::<sha1::Sha1>::new(key).verify(message, &signature)
            },
            HashAlgorithm::Sha256 => {
                pkcs1v15::VerifyingKey::<sha2::Sha256>::new(key).verify(message, &signature)
            },
            HashAlgorithm::Sha384 => {
                pkcs1v15::VerifyingKey::<sha2::Sha384>::new(key).verify(message, &signature)
            },
            HashAlgorithm::Sha512 => {
                pkcs1v15::VerifyingKey::<sha2::Sha512>::new(key).verify(message, &signature)
            },
        }
        .map_err(|_| Error::SignatureVerificationFailed)
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        let private = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| Error::backend("RSA key generation", e))?;
        let public = RsaPublicKey::from(&private);

        let private_der = private
            .to_pkcs1_der()
            .map_err(|_| Error::InvalidPrivateKey)?;
        let public_der = public.to_pkcs1_der().map_err(|_| Error::InvalidPublicKey)?;

        Ok((
            SigningKey::from_bytes(private_der.as_bytes().to_vec()),
            VerifyingKey::from_bytes(public_der.as_bytes().to_vec()),
        ))
    }
}

/// ECDSA over P-256 or P-384 with DER signatures.
#[derive(Debug)]
struct Ecdsa {
    algorithm: SignatureAlgorithm,
}

impl Signature for Ecdsa {
    fn sign(&self, signing_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
        use p256::ecdsa::signature::hazmat::PrehashSigner;

        let digest = prehash(self.algorithm.hash(), message);
        match signing_key.len() {
            32 => {
                let key = p256::ecdsa::SigningKey::from_slice(signing_key)
                    .map_err(|_| Error::InvalidPrivateKey)?;
                let signature: p256::ecdsa::Signature = key
                    .sign_prehash(&digest)
                    .map_err(|e| Error::backend("ECDSA signing", e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            },
            48 => {
                let key = p384::ecdsa::SigningKey::from_slice(signing_key)
                    .map_err(|_| Error::InvalidPrivateKey)?;
                let signature: p384::ecdsa::Signature = key
                    .sign_prehash(&digest)
                    .map_err(|e| Error::backend("ECDSA signing", e))?;
                Ok(signature.to_der().as_bytes().to_vec())
            },
            _ => Err(Error::InvalidPrivateKey),
        }
    }

    fn verify(&self, verifying_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        use p256::ecdsa::signature::hazmat::PrehashVerifier;

        let digest = prehash(self.algorithm.hash(), message);
        match verifying_key.len() {
            65 => {
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(verifying_key)
                    .map_err(|_| Error::InvalidPublicKey)?;
                let signature = p256::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::InvalidSignature)?;
                key.verify_prehash(&digest, &signature)
                    .map_err(|_| Error::SignatureVerificationFailed)
            },
            97 => {
                let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(verifying_key)
                    .map_err(|_| Error::InvalidPublicKey)?;
                let signature = p384::ecdsa::Signature::from_der(signature)
                    .map_err(|_| Error::InvalidSignature)?;
                key.verify_prehash(&digest, &signature)
                    .map_err(|_| Error::SignatureVerificationFailed)
            },
            _ => Err(Error::InvalidPublicKey),
        }
    }

    fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// `EcdsaSha256` keys live on P-256 and `EcdsaSha384` keys on P-384.
    fn generate_keypair(&self) -> Result<(SigningKey, VerifyingKey)> {
        match self.algorithm {
            SignatureAlgorithm::EcdsaSha384 => {
                let key = p384::ecdsa::SigningKey::random(&mut OsRng);
                let point = key.verifying_key().to_encoded_point(false);
                Ok((
                    SigningKey::from_bytes(key.to_bytes().to_vec()),
                    VerifyingKey::from_bytes(point.as_bytes().to_vec()),
                ))
            },
            _ => {
                let key = p256::ecdsa::SigningKey::random(&mut OsRng);
                let point = key.verifying_key().to_encoded_point(false);
                Ok((
                    SigningKey::from_bytes(key.to_bytes().to_vec()),
                    VerifyingKey::from_bytes(point.as_bytes().to_vec()),
                ))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    // One RSA key shared by all tests, generation dominates runtime.
    fn rsa_keypair() -> &'static (SigningKey, VerifyingKey) {
        static KEYS: OnceLock<(SigningKey, VerifyingKey)> = OnceLock::new();
        KEYS.get_or_init(|| {
            create_signature(SignatureAlgorithm::RsaPkcs1Sha256)
                .unwrap()
                .generate_keypair()
                .expect("Failed to generate RSA key")
        })
    }

    #[test]
    fn test_rsa_sign_verify_every_hash() {
        let (sk, vk) = rsa_keypair();
        for alg in SignatureAlgorithm::ALL
            .into_iter()
            .filter(|a| a.key_kind() == KeyKind::Rsa)
        {
            let signer = create_signature(alg).unwrap();
            let sig = signer.sign(sk.as_bytes(), b"hello tls").unwrap();
            assert_eq!(sig.len(), RSA_KEY_BITS / 8);
            signer.verify(vk.as_bytes(), b"hello tls", &sig).unwrap();
            assert_eq!(
                signer.verify(vk.as_bytes(), b"hello tla", &sig),
                Err(Error::SignatureVerificationFailed)
            );
        }
    }

    #[test]
    fn test_rsa_hash_mismatch_fails() {
        let (sk, vk) = rsa_keypair();
        let sig = create_signature(SignatureAlgorithm::RsaPkcs1Sha256)
            .unwrap()
            .sign(sk.as_bytes(), b"message")
            .unwrap();
        let verifier = create_signature(SignatureAlgorithm::RsaPkcs1Sha384).unwrap();
        assert!(verifier.verify(vk.as_bytes(), b"message", &sig).is_err());
    }

    #[test]
    fn test_ecdsa_cross_hash_and_curve() {
        for key_alg in [SignatureAlgorithm::EcdsaSha256, SignatureAlgorithm::EcdsaSha384] {
            let (sk, vk) = create_signature(key_alg).unwrap().generate_keypair().unwrap();
            for hash_alg in [SignatureAlgorithm::EcdsaSha256, SignatureAlgorithm::EcdsaSha384] {
                let signer = create_signature(hash_alg).unwrap();
                let sig = signer.sign(sk.as_bytes(), b"server params").unwrap();
                assert_eq!(sig[0], 0x30, "ECDSA signatures are DER sequences");
                signer.verify(vk.as_bytes(), b"server params", &sig).unwrap();
            }
        }
    }

    #[test]
    fn test_ecdsa_key_sizes() {
        let (sk, vk) = create_signature(SignatureAlgorithm::EcdsaSha384)
            .unwrap()
            .generate_keypair()
            .unwrap();
        assert_eq!(sk.as_bytes().len(), 48);
        assert_eq!(vk.as_bytes().len(), 97);
    }

    #[test]
    fn test_ecdsa_garbage_signature() {
        let signer = create_signature(SignatureAlgorithm::EcdsaSha256).unwrap();
        let (_, vk) = signer.generate_keypair().unwrap();
        assert_eq!(
            signer.verify(vk.as_bytes(), b"m", &[0x01, 0x02]),
            Err(Error::InvalidSignature)
        );
    }
}
