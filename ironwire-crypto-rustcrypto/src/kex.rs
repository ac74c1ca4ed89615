//! ECDH key exchange on the NIST curves using `p256` and `p384`.

use ironwire_crypto::{
    Error, KeyExchange, KeyExchangeAlgorithm, PrivateKey, PublicKey, Result, SharedSecret,
};
use rand::rngs::OsRng;

/// Create a key exchange instance for the specified algorithm.
pub fn create_key_exchange(algorithm: KeyExchangeAlgorithm) -> Result<Box<dyn KeyExchange>> {
    match algorithm {
        KeyExchangeAlgorithm::Secp256r1 => Ok(Box::new(EcdhP256)),
        KeyExchangeAlgorithm::Secp384r1 => Ok(Box::new(EcdhP384)),
    }
}

macro_rules! ecdh_curve {
    ($name:ident, $curve:ident, $algorithm:expr) => {
        #[doc = concat!("ECDH over `", stringify!($curve), "`.")]
        #[derive(Debug)]
        struct $name;

        impl KeyExchange for $name {
            fn generate_keypair(&self) -> Result<(PrivateKey, PublicKey)> {
                use $curve::elliptic_curve::sec1::ToEncodedPoint;

                let secret = $curve::SecretKey::random(&mut OsRng);
                let public = secret.public_key().to_encoded_point(false);

                Ok((
                    PrivateKey::from_bytes(secret.to_bytes().to_vec()),
                    PublicKey::from_bytes(public.as_bytes().to_vec()),
                ))
            }

            fn exchange(
                &self,
                private_key: &PrivateKey,
                peer_public_key: &[u8],
            ) -> Result<SharedSecret> {
                let secret = $curve::SecretKey::from_slice(private_key.as_bytes())
                    .map_err(|_| Error::InvalidPrivateKey)?;
                let peer = $curve::PublicKey::from_sec1_bytes(peer_public_key)
                    .map_err(|_| Error::InvalidPublicKey)?;

                let shared =
                    $curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
                Ok(SharedSecret::from_bytes(shared.raw_secret_bytes().to_vec()))
            }

            fn algorithm(&self) -> KeyExchangeAlgorithm {
                $algorithm
            }
        }
    };
}

ecdh_curve!(EcdhP256, p256, KeyExchangeAlgorithm::Secp256r1);
ecdh_curve!(EcdhP384, p384, KeyExchangeAlgorithm::Secp384r1);

#[cfg(test)]
mod tests {
    use super::*;

    fn agree(algorithm: KeyExchangeAlgorithm) {
        let kex = create_key_exchange(algorithm).unwrap();
        let (client_private, client_public) = kex.generate_keypair().unwrap();
        let (server_private, server_public) = kex.generate_keypair().unwrap();

        assert_eq!(client_public.as_bytes().len(), algorithm.public_key_size());
        assert_eq!(client_public.as_bytes()[0], 0x04);

        let client_secret = kex.exchange(&client_private, server_public.as_bytes()).unwrap();
        let server_secret = kex.exchange(&server_private, client_public.as_bytes()).unwrap();

        assert_eq!(client_secret.as_bytes(), server_secret.as_bytes());
        assert_eq!(client_secret.as_bytes().len(), algorithm.shared_secret_size());
    }

    #[test]
    fn test_ecdh_p256() {
        agree(KeyExchangeAlgorithm::Secp256r1);
    }

    #[test]
    fn test_ecdh_p384() {
        agree(KeyExchangeAlgorithm::Secp384r1);
    }

    #[test]
    fn test_point_not_on_curve_rejected() {
        let kex = create_key_exchange(KeyExchangeAlgorithm::Secp256r1).unwrap();
        let (private, _) = kex.generate_keypair().unwrap();
        let mut bogus = vec![0x04];
        bogus.extend_from_slice(&[0x11; 64]);
        assert_eq!(
            kex.exchange(&private, &bogus).unwrap_err(),
            Error::InvalidPublicKey
        );
    }
}
