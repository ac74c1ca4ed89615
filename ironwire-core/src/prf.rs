//! TLS 1.2 PRF (Pseudorandom Function) - RFC 5246 Section 5
//!
//! PRF(secret, label, seed) = P_<hash>(secret, label + seed)
//!
//! Where P_hash is defined as:
//! P_hash(secret, seed) = HMAC_hash(secret, A(1) + seed) +
//!                         HMAC_hash(secret, A(2) + seed) +
//!                         HMAC_hash(secret, A(3) + seed) + ...
//!
//! A(0) = seed
//! A(i) = HMAC_hash(secret, A(i-1))

use crate::error::{Error, Result};
use crate::protocol::{MASTER_SECRET_SIZE, RANDOM_SIZE, VERIFY_DATA_SIZE};
use ironwire_crypto::{CryptoProvider, HashAlgorithm};
use zeroize::Zeroizing;

/// Label for the master secret derivation.
pub const MASTER_SECRET_LABEL: &[u8] = b"master secret";

/// Label for the key block derivation.
pub const KEY_EXPANSION_LABEL: &[u8] = b"key expansion";

/// Label for the client's Finished.
pub const CLIENT_FINISHED_LABEL: &[u8] = b"client finished";

/// Label for the server's Finished.
pub const SERVER_FINISHED_LABEL: &[u8] = b"server finished";

/// TLS 1.2 PRF bound to one hash.
pub struct Prf<'a> {
    provider: &'a dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
}

impl<'a> Prf<'a> {
    /// Create a new PRF with the specified hash algorithm.
    pub fn new(provider: &'a dyn CryptoProvider, hash_algorithm: HashAlgorithm) -> Self {
        Self {
            provider,
            hash_algorithm,
        }
    }

    /// `P_hash(secret, label + seed)` truncated to exactly `output_len` bytes.
    pub fn compute(
        &self,
        secret: &[u8],
        label: &[u8],
        seed: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut label_seed = Vec::with_capacity(label.len() + seed.len());
        label_seed.extend_from_slice(label);
        label_seed.extend_from_slice(seed);

        self.p_hash(secret, &label_seed, output_len)
    }

    /// The raw P_hash expansion.
    pub fn p_hash(
        &self,
        secret: &[u8],
        seed: &[u8],
        output_len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let mut output = Zeroizing::new(Vec::with_capacity(output_len));

        // A(0) = seed
        let mut a = Zeroizing::new(seed.to_vec());

        while output.len() < output_len {
            // A(i) = HMAC_hash(secret, A(i-1))
            a = Zeroizing::new(self.hmac(secret, &[&a])?);

            let chunk = Zeroizing::new(self.hmac(secret, &[&a, seed])?);
            let take = chunk.len().min(output_len - output.len());
            output.extend_from_slice(&chunk[..take]);
        }

        Ok(output)
    }

    fn hmac(&self, key: &[u8], parts: &[&[u8]]) -> Result<Vec<u8>> {
        let mut hmac = self.provider.hmac(self.hash_algorithm, key)?;
        for part in parts {
            hmac.update(part);
        }
        Ok(hmac.finalize())
    }
}

fn check_random(name: &str, value: &[u8]) -> Result<()> {
    if value.len() != RANDOM_SIZE {
        return Err(Error::Internal(format!(
            "{} random must be {} bytes, got {}",
            name,
            RANDOM_SIZE,
            value.len()
        )));
    }
    Ok(())
}

/// master_secret = PRF(pre_master_secret, "master secret",
///                     ClientHello.random + ServerHello.random)[0..47]
pub fn compute_master_secret(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    premaster_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    check_random("Client", client_random)?;
    check_random("Server", server_random)?;

    let mut seed = Vec::with_capacity(2 * RANDOM_SIZE);
    seed.extend_from_slice(client_random);
    seed.extend_from_slice(server_random);

    Prf::new(provider, hash_algorithm).compute(
        premaster_secret,
        MASTER_SECRET_LABEL,
        &seed,
        MASTER_SECRET_SIZE,
    )
}

/// key_block = PRF(master_secret, "key expansion",
///                 server_random + client_random)
///
/// Note the seed order is reversed from the master secret derivation.
pub fn compute_key_block(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    master_secret: &[u8],
    server_random: &[u8],
    client_random: &[u8],
    key_block_len: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    if master_secret.len() != MASTER_SECRET_SIZE {
        return Err(Error::Internal(format!(
            "Master secret must be {} bytes, got {}",
            MASTER_SECRET_SIZE,
            master_secret.len()
        )));
    }
    check_random("Server", server_random)?;
    check_random("Client", client_random)?;

    let mut seed = Vec::with_capacity(2 * RANDOM_SIZE);
    seed.extend_from_slice(server_random);
    seed.extend_from_slice(client_random);

    Prf::new(provider, hash_algorithm).compute(
        master_secret,
        KEY_EXPANSION_LABEL,
        &seed,
        key_block_len,
    )
}

/// verify_data = PRF(master_secret, finished_label, Hash(handshake_messages))[0..11]
pub fn compute_verify_data(
    provider: &dyn CryptoProvider,
    hash_algorithm: HashAlgorithm,
    master_secret: &[u8],
    finished_label: &[u8],
    handshake_hash: &[u8],
) -> Result<Vec<u8>> {
    let out = Prf::new(provider, hash_algorithm).compute(
        master_secret,
        finished_label,
        handshake_hash,
        VERIFY_DATA_SIZE,
    )?;
    Ok(out.to_vec())
}
