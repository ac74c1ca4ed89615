//! TLS 1.2 record protection (RFC 5246 Section 6.2.3, RFC 5288).
//!
//! # AES-GCM
//!
//! ```text
//! nonce           = fixed_iv (4 bytes) || explicit_nonce (8 bytes)
//! explicit_nonce  = sequence number, sent in clear before the ciphertext
//! additional_data = seq_num (8) || type (1) || version (2) || length (2)
//! ```
//!
//! # AES-CBC with HMAC
//!
//! ```text
//! MAC      = HMAC(mac_key, seq_num || type || version || length || content)
//! record   = IV (16, random) || CBC(content || MAC || padding)
//! padding  = (pad + 1) bytes, each of value pad
//! ```
//!
//! Each direction keeps its own 64-bit sequence number, starting at zero
//! when the cipher is switched on by ChangeCipherSpec.

use crate::cipher_suites::{BulkCipher, CipherSuite};
use crate::error::{Error, Result};
use crate::key_schedule::DirectionKeys;
use crate::protocol::{ContentType, ProtocolVersion};
use crate::record::MAX_FRAGMENT_SIZE;
use bytes::BufMut;
use ironwire_crypto::{AeadAlgorithm, BlockCipherAlgorithm, CryptoProvider};
use subtle::{Choice, ConstantTimeEq};

/// Explicit nonce carried by GCM records.
const EXPLICIT_NONCE_SIZE: usize = 8;

fn bad_record_mac() -> Error {
    Error::Crypto(ironwire_crypto::Error::AuthenticationFailed)
}

/// One direction of record encryption or decryption.
pub struct RecordProtection {
    suite: CipherSuite,
    keys: DirectionKeys,
    sequence_number: u64,
}

impl std::fmt::Debug for RecordProtection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordProtection")
            .field("suite", &self.suite)
            .field("sequence_number", &self.sequence_number)
            .finish()
    }
}

impl RecordProtection {
    /// Create a new instance with the sequence number at zero.
    pub fn new(suite: CipherSuite, keys: DirectionKeys) -> Self {
        Self {
            suite,
            keys,
            sequence_number: 0,
        }
    }

    /// Negotiated suite.
    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// Sequence number of the next record.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    fn next_sequence(&mut self) -> Result<u64> {
        let seq = self.sequence_number;
        self.sequence_number = seq
            .checked_add(1)
            .ok_or_else(|| Error::Internal("Record sequence number exhausted".into()))?;
        Ok(seq)
    }

    /// Protect one plaintext fragment.
    pub fn encrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        version: ProtocolVersion,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        if plaintext.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::RecordOverflow(plaintext.len()));
        }
        let seq = self.next_sequence()?;
        match self.suite.bulk_cipher() {
            BulkCipher::Gcm(alg) => self.seal_gcm(provider, alg, seq, content_type, version, plaintext),
            BulkCipher::Cbc(alg) => self.seal_cbc(provider, alg, seq, content_type, version, plaintext),
        }
    }

    /// Remove protection from one record payload.
    ///
    /// Any authentication failure surfaces as
    /// `Error::Crypto(AuthenticationFailed)`, which maps to `bad_record_mac`.
    pub fn decrypt(
        &mut self,
        provider: &dyn CryptoProvider,
        content_type: ContentType,
        version: ProtocolVersion,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        let seq = self.next_sequence()?;
        let plaintext = match self.suite.bulk_cipher() {
            BulkCipher::Gcm(alg) => self.open_gcm(provider, alg, seq, content_type, version, payload)?,
            BulkCipher::Cbc(alg) => self.open_cbc(provider, alg, seq, content_type, version, payload)?,
        };
        if plaintext.len() > MAX_FRAGMENT_SIZE {
            return Err(Error::RecordOverflow(plaintext.len()));
        }
        Ok(plaintext)
    }

    fn seal_gcm(
        &self,
        provider: &dyn CryptoProvider,
        alg: AeadAlgorithm,
        seq: u64,
        content_type: ContentType,
        version: ProtocolVersion,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let explicit_nonce = seq.to_be_bytes();
        let nonce = [&self.keys.iv[..], &explicit_nonce[..]].concat();
        let aad = additional_data(seq, content_type, version, plaintext.len());

        let ciphertext = provider
            .aead(alg)?
            .seal(&self.keys.key, &nonce, &aad, plaintext)?;

        let mut out = Vec::with_capacity(EXPLICIT_NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&explicit_nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn open_gcm(
        &self,
        provider: &dyn CryptoProvider,
        alg: AeadAlgorithm,
        seq: u64,
        content_type: ContentType,
        version: ProtocolVersion,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        if payload.len() < EXPLICIT_NONCE_SIZE + alg.tag_size() {
            return Err(bad_record_mac());
        }
        let (explicit_nonce, ciphertext) = payload.split_at(EXPLICIT_NONCE_SIZE);
        let nonce = [&self.keys.iv[..], explicit_nonce].concat();
        let aad = additional_data(seq, content_type, version, ciphertext.len() - alg.tag_size());

        provider
            .aead(alg)?
            .open(&self.keys.key, &nonce, &aad, ciphertext)
            .map_err(|_| bad_record_mac())
    }

    fn mac(
        &self,
        provider: &dyn CryptoProvider,
        seq: u64,
        content_type: ContentType,
        version: ProtocolVersion,
        content: &[u8],
    ) -> Result<Vec<u8>> {
        let mut hmac = provider.hmac(self.suite.hash(), &self.keys.mac_key)?;
        hmac.update(&additional_data(seq, content_type, version, content.len()));
        hmac.update(content);
        Ok(hmac.finalize())
    }

    fn seal_cbc(
        &self,
        provider: &dyn CryptoProvider,
        alg: BlockCipherAlgorithm,
        seq: u64,
        content_type: ContentType,
        version: ProtocolVersion,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let block = alg.block_size();
        let mac = self.mac(provider, seq, content_type, version, plaintext)?;

        let unpadded = plaintext.len() + mac.len() + 1;
        let pad = (block - unpadded % block) % block;

        let mut data = Vec::with_capacity(unpadded + pad);
        data.extend_from_slice(plaintext);
        data.extend_from_slice(&mac);
        data.resize(unpadded + pad, pad as u8);

        let iv = provider.random().generate(self.suite.record_iv_len())?;
        let ciphertext = provider.block_cipher(alg)?.encrypt(&self.keys.key, &iv, &data)?;

        let mut out = Vec::with_capacity(iv.len() + ciphertext.len());
        out.put_slice(&iv);
        out.put_slice(&ciphertext);
        Ok(out)
    }

    fn open_cbc(
        &self,
        provider: &dyn CryptoProvider,
        alg: BlockCipherAlgorithm,
        seq: u64,
        content_type: ContentType,
        version: ProtocolVersion,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        let block = alg.block_size();
        let iv_len = self.suite.record_iv_len();
        let mac_len = self.suite.mac_len();

        if payload.len() < iv_len + block
            || (payload.len() - iv_len) % block != 0
            || payload.len() - iv_len < mac_len + 1
        {
            return Err(bad_record_mac());
        }

        let (iv, ciphertext) = payload.split_at(iv_len);
        let data = provider
            .block_cipher(alg)?
            .decrypt(&self.keys.key, iv, ciphertext)
            .map_err(|_| bad_record_mac())?;

        // Padding is checked without early exit, and a MAC is computed even
        // when the padding is bad.
        let pad = data[data.len() - 1] as usize;
        let mut padding_ok = Choice::from((pad + 1 + mac_len <= data.len()) as u8);
        let pad_used = if bool::from(padding_ok) { pad } else { 0 };
        for &byte in &data[data.len() - 1 - pad_used..data.len() - 1] {
            padding_ok &= byte.ct_eq(&(pad as u8));
        }

        let content_len = data.len() - 1 - pad_used - mac_len;
        let (content, rest) = data.split_at(content_len);
        let received_mac = &rest[..mac_len];
        let expected_mac = self.mac(provider, seq, content_type, version, content)?;

        if bool::from(padding_ok & expected_mac.ct_eq(received_mac)) {
            Ok(content.to_vec())
        } else {
            Err(bad_record_mac())
        }
    }
}

/// `seq_num || type || version || length`.
fn additional_data(
    seq: u64,
    content_type: ContentType,
    version: ProtocolVersion,
    length: usize,
) -> [u8; 13] {
    let mut ad = [0u8; 13];
    ad[..8].copy_from_slice(&seq.to_be_bytes());
    ad[8] = content_type.to_u8();
    ad[9..11].copy_from_slice(&version.to_u16().to_be_bytes());
    ad[11..].copy_from_slice(&(length as u16).to_be_bytes());
    ad
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_schedule::KeyMaterial;
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    fn pair(suite: CipherSuite) -> (RecordProtection, RecordProtection) {
        let block: Vec<u8> = (0..suite.key_block_len()).map(|i| (i * 7) as u8).collect();
        let km = KeyMaterial::from_key_block(suite, &block).unwrap();
        (
            RecordProtection::new(suite, km.client.clone()),
            RecordProtection::new(suite, km.client),
        )
    }

    #[test]
    fn test_gcm_record_layout() {
        let provider = RustCryptoProvider::new();
        let (mut tx, mut rx) = pair(CipherSuite::RsaWithAes128GcmSha256);

        let first = tx
            .encrypt(&provider, ContentType::Handshake, ProtocolVersion::Tls12, b"hello")
            .unwrap();
        assert_eq!(&first[..8], &0u64.to_be_bytes());
        assert_eq!(first.len(), 8 + 5 + 16);

        let second = tx
            .encrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, b"x")
            .unwrap();
        assert_eq!(&second[..8], &1u64.to_be_bytes());

        assert_eq!(
            rx.decrypt(&provider, ContentType::Handshake, ProtocolVersion::Tls12, &first)
                .unwrap(),
            b"hello"
        );
        assert_eq!(
            rx.decrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, &second)
                .unwrap(),
            b"x"
        );
        assert_eq!(rx.sequence_number(), 2);
    }

    #[test]
    fn test_gcm_tamper_and_type_binding() {
        let provider = RustCryptoProvider::new();
        let (mut tx, mut rx) = pair(CipherSuite::EcdheRsaWithAes256GcmSha384);
        let mut record = tx
            .encrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, b"data")
            .unwrap();
        // wrong content type in the additional data
        let err = rx
            .decrypt(&provider, ContentType::Handshake, ProtocolVersion::Tls12, &record)
            .unwrap_err();
        assert_eq!(err, bad_record_mac());

        let (_, mut rx) = pair(CipherSuite::EcdheRsaWithAes256GcmSha384);
        record[10] ^= 1;
        assert!(rx
            .decrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, &record)
            .is_err());
    }

    #[test]
    fn test_cbc_padding_and_mac() {
        let provider = RustCryptoProvider::new();
        for len in [0usize, 1, 11, 12, 27, 100] {
            let (mut tx, mut rx) = pair(CipherSuite::RsaWithAes128CbcSha);
            let plaintext = vec![0x42u8; len];
            let record = tx
                .encrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, &plaintext)
                .unwrap();
            assert_eq!((record.len() - 16) % 16, 0);
            assert!(record.len() >= 16 + len + 20 + 1);
            assert_eq!(
                rx.decrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, &record)
                    .unwrap(),
                plaintext
            );
        }
    }

    #[test]
    fn test_cbc_tamper_is_bad_record_mac() {
        let provider = RustCryptoProvider::new();
        let (mut tx, mut rx) = pair(CipherSuite::RsaWithAes256CbcSha);
        let mut record = tx
            .encrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, b"payload")
            .unwrap();
        let last = record.len() - 1;
        record[last] ^= 0x80;
        let err = rx
            .decrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, &record)
            .unwrap_err();
        assert_eq!(err.alert(), Some(crate::alert::AlertDescription::BadRecordMac));

        // not a whole number of blocks
        let (_, mut rx) = pair(CipherSuite::RsaWithAes256CbcSha);
        assert_eq!(
            rx.decrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, &[0u8; 40])
                .unwrap_err(),
            bad_record_mac()
        );
    }

    #[test]
    fn test_oversized_plaintext_rejected() {
        let provider = RustCryptoProvider::new();
        let (mut tx, _) = pair(CipherSuite::RsaWithAes128GcmSha256);
        let big = vec![0u8; MAX_FRAGMENT_SIZE + 1];
        assert!(tx
            .encrypt(&provider, ContentType::ApplicationData, ProtocolVersion::Tls12, &big)
            .unwrap_err()
            .is_framing());
    }
}
