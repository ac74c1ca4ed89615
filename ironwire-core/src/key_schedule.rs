//! TLS 1.2 key schedule (RFC 5246 Sections 6.3 and 8.1).
//!
//! ```text
//!   pre_master_secret
//!          |
//!          v
//!   PRF(., "master secret", client_random + server_random)[0..47]
//!          = master_secret
//!          |
//!          v
//!   PRF(., "key expansion", server_random + client_random)
//!          = key_block
//!          |
//!          +--> client_write_MAC_key
//!          +--> server_write_MAC_key
//!          +--> client_write_key
//!          +--> server_write_key
//!          +--> client_write_IV
//!          +--> server_write_IV
//! ```
//!
//! The master secret is set exactly once per connection. Key material is
//! derived from it on first use and cached.

use crate::cipher_suites::CipherSuite;
use crate::error::{Error, Result};
use crate::prf;
use crate::protocol::{Role, MASTER_SECRET_SIZE, RANDOM_SIZE};
use ironwire_crypto::CryptoProvider;
use zeroize::Zeroizing;

/// Keys for one direction of the record layer.
#[derive(Clone)]
pub struct DirectionKeys {
    /// HMAC key (empty for AEAD suites)
    pub mac_key: Zeroizing<Vec<u8>>,
    /// Bulk cipher key
    pub key: Zeroizing<Vec<u8>>,
    /// Fixed IV (GCM salt; unused for CBC, which sends a fresh IV per record)
    pub iv: Zeroizing<Vec<u8>>,
}

impl std::fmt::Debug for DirectionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectionKeys")
            .field("mac_key_len", &self.mac_key.len())
            .field("key_len", &self.key.len())
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

/// The key block, sliced per direction.
#[derive(Clone, Debug)]
pub struct KeyMaterial {
    /// Keys protecting client-to-server records
    pub client: DirectionKeys,
    /// Keys protecting server-to-client records
    pub server: DirectionKeys,
}

impl KeyMaterial {
    /// Slice a key block in the fixed RFC 5246 order.
    pub fn from_key_block(suite: CipherSuite, block: &[u8]) -> Result<Self> {
        if block.len() != suite.key_block_len() {
            return Err(Error::Internal(format!(
                "Key block for {} must be {} bytes, got {}",
                suite.name(),
                suite.key_block_len(),
                block.len()
            )));
        }

        let mac = suite.mac_len();
        let key = suite.key_len();
        let iv = suite.fixed_iv_len();

        let mut offset = 0;
        let mut next = |len: usize| {
            let part = Zeroizing::new(block[offset..offset + len].to_vec());
            offset += len;
            part
        };

        let client_mac_key = next(mac);
        let server_mac_key = next(mac);
        let client_key = next(key);
        let server_key = next(key);
        let client_iv = next(iv);
        let server_iv = next(iv);

        Ok(Self {
            client: DirectionKeys {
                mac_key: client_mac_key,
                key: client_key,
                iv: client_iv,
            },
            server: DirectionKeys {
                mac_key: server_mac_key,
                key: server_key,
                iv: server_iv,
            },
        })
    }

    /// Keys used by `role` when writing.
    pub fn write_keys(&self, role: Role) -> &DirectionKeys {
        match role {
            Role::Client => &self.client,
            Role::Server => &self.server,
        }
    }

    /// Keys used by `role` when reading.
    pub fn read_keys(&self, role: Role) -> &DirectionKeys {
        self.write_keys(role.peer())
    }

    /// Every byte of the key block, in derivation order.
    pub fn to_key_block(&self) -> Vec<u8> {
        [
            &self.client.mac_key[..],
            &self.server.mac_key[..],
            &self.client.key[..],
            &self.server.key[..],
            &self.client.iv[..],
            &self.server.iv[..],
        ]
        .concat()
    }
}

/// Per-connection secret state.
pub struct KeySchedule {
    suite: CipherSuite,
    client_random: [u8; RANDOM_SIZE],
    server_random: [u8; RANDOM_SIZE],
    master_secret: Option<Zeroizing<Vec<u8>>>,
    key_material: Option<KeyMaterial>,
}

impl std::fmt::Debug for KeySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySchedule")
            .field("suite", &self.suite)
            .field("has_master_secret", &self.master_secret.is_some())
            .finish()
    }
}

impl KeySchedule {
    /// Bind the schedule to the negotiated suite and both hello randoms.
    pub fn new(
        suite: CipherSuite,
        client_random: [u8; RANDOM_SIZE],
        server_random: [u8; RANDOM_SIZE],
    ) -> Self {
        Self {
            suite,
            client_random,
            server_random,
            master_secret: None,
            key_material: None,
        }
    }

    /// Negotiated suite.
    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Derive the master secret. The pre-master secret is consumed and wiped.
    ///
    /// Calling this twice is an error.
    pub fn derive_master_secret(
        &mut self,
        provider: &dyn CryptoProvider,
        premaster_secret: Zeroizing<Vec<u8>>,
    ) -> Result<()> {
        let master = prf::compute_master_secret(
            provider,
            self.suite.prf_hash(),
            &premaster_secret,
            &self.client_random,
            &self.server_random,
        )?;
        drop(premaster_secret);
        self.set_master_secret(master)
    }

    /// Install an already derived master secret.
    pub fn set_master_secret(&mut self, master: Zeroizing<Vec<u8>>) -> Result<()> {
        if self.master_secret.is_some() {
            return Err(Error::Internal("Master secret already set".into()));
        }
        if master.len() != MASTER_SECRET_SIZE {
            return Err(Error::Internal(format!(
                "Master secret must be {} bytes, got {}",
                MASTER_SECRET_SIZE,
                master.len()
            )));
        }
        self.master_secret = Some(master);
        Ok(())
    }

    /// The master secret, once derived.
    pub fn master_secret(&self) -> Result<&[u8]> {
        self.master_secret
            .as_deref()
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Internal("Master secret not yet derived".into()))
    }

    /// Key material, derived from the master secret on first use.
    pub fn key_material(&mut self, provider: &dyn CryptoProvider) -> Result<&KeyMaterial> {
        if self.key_material.is_none() {
            let block = prf::compute_key_block(
                provider,
                self.suite.prf_hash(),
                self.master_secret()?,
                &self.server_random,
                &self.client_random,
                self.suite.key_block_len(),
            )?;
            self.key_material = Some(KeyMaterial::from_key_block(self.suite, &block)?);
        }
        self.key_material
            .as_ref()
            .ok_or_else(|| Error::Internal("Key material unavailable".into()))
    }

    /// Finished verify data for the Finished sent by `sender`.
    pub fn verify_data(
        &self,
        provider: &dyn CryptoProvider,
        sender: Role,
        handshake_hash: &[u8],
    ) -> Result<Vec<u8>> {
        let label = match sender {
            Role::Client => prf::CLIENT_FINISHED_LABEL,
            Role::Server => prf::SERVER_FINISHED_LABEL,
        };
        prf::compute_verify_data(
            provider,
            self.suite.prf_hash(),
            self.master_secret()?,
            label,
            handshake_hash,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_key_block_slicing_order() {
        let suite = CipherSuite::RsaWithAes128CbcSha;
        let block: Vec<u8> = (0..suite.key_block_len()).map(|i| i as u8).collect();
        let km = KeyMaterial::from_key_block(suite, &block).unwrap();

        // 20 + 20 MAC, 16 + 16 key, 16 + 16 IV
        assert_eq!(km.client.mac_key[0], 0);
        assert_eq!(km.server.mac_key[0], 20);
        assert_eq!(km.client.key[0], 40);
        assert_eq!(km.server.key[0], 56);
        assert_eq!(km.client.iv[0], 72);
        assert_eq!(km.server.iv[0], 88);
        assert_eq!(km.to_key_block(), block);
    }

    #[test]
    fn test_gcm_key_block_has_no_mac_keys() {
        let suite = CipherSuite::EcdheRsaWithAes256GcmSha384;
        let block = vec![7u8; suite.key_block_len()];
        let km = KeyMaterial::from_key_block(suite, &block).unwrap();
        assert!(km.client.mac_key.is_empty());
        assert_eq!(km.client.key.len(), 32);
        assert_eq!(km.server.iv.len(), 4);
        assert!(KeyMaterial::from_key_block(suite, &block[1..]).is_err());
    }

    #[test]
    fn test_master_secret_set_once() {
        let provider = RustCryptoProvider::new();
        let mut schedule =
            KeySchedule::new(CipherSuite::RsaWithAes128GcmSha256, [1u8; 32], [2u8; 32]);
        assert!(schedule.master_secret().is_err());
        assert!(schedule.key_material(&provider).is_err());

        schedule
            .derive_master_secret(&provider, Zeroizing::new(vec![3u8; 48]))
            .unwrap();
        assert_eq!(schedule.master_secret().unwrap().len(), 48);
        assert!(schedule
            .derive_master_secret(&provider, Zeroizing::new(vec![3u8; 48]))
            .is_err());
    }

    #[test]
    fn test_roles_read_each_others_keys() {
        let provider = RustCryptoProvider::new();
        let mut schedule =
            KeySchedule::new(CipherSuite::RsaWithAes128GcmSha256, [1u8; 32], [2u8; 32]);
        schedule
            .derive_master_secret(&provider, Zeroizing::new(vec![3u8; 48]))
            .unwrap();
        let km = schedule.key_material(&provider).unwrap().clone();
        assert_eq!(
            km.write_keys(Role::Client).key.as_slice(),
            km.read_keys(Role::Server).key.as_slice()
        );
        assert_ne!(km.client.key.as_slice(), km.server.key.as_slice());
    }
}
