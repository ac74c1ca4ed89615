//! X.509 v3 certificate builder.

use crate::der::{encode, Encoder};
use crate::{Error, Result};
use ironwire_crypto::{CryptoProvider, SignatureAlgorithm};
use std::net::IpAddr;
use zeroize::Zeroizing;

mod oid {
    pub(super) const COMMON_NAME: &[u8] = &[0x55, 0x04, 0x03];
    pub(super) const RSA_ENCRYPTION: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01];
    pub(super) const SHA256_WITH_RSA: &[u8] = &[0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x0B];
    pub(super) const EC_PUBLIC_KEY: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x02, 0x01];
    pub(super) const PRIME256V1: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
    pub(super) const SECP384R1: &[u8] = &[0x2B, 0x81, 0x04, 0x00, 0x22];
    pub(super) const ECDSA_WITH_SHA256: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x02];
    pub(super) const ECDSA_WITH_SHA384: &[u8] = &[0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x04, 0x03, 0x03];
    pub(super) const KEY_USAGE: &[u8] = &[0x55, 0x1D, 0x0F];
    pub(super) const SUBJECT_ALT_NAME: &[u8] = &[0x55, 0x1D, 0x11];
    pub(super) const BASIC_CONSTRAINTS: &[u8] = &[0x55, 0x1D, 0x13];
    pub(super) const EXT_KEY_USAGE: &[u8] = &[0x55, 0x1D, 0x25];
    pub(super) const SERVER_AUTH: &[u8] = &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x01];
    pub(super) const CLIENT_AUTH: &[u8] = &[0x2B, 0x06, 0x01, 0x05, 0x05, 0x07, 0x03, 0x02];
}

const DAY: i64 = 86_400;

const NULL_PARAMETERS: &[u8] = &[0x05, 0x00];

/// Key pair type for a generated certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// ECDSA on P-256, signs with SHA-256
    EcdsaP256,
    /// ECDSA on P-384, signs with SHA-384
    EcdsaP384,
    /// 2048-bit RSA, signs with PKCS#1 v1.5 and SHA-256
    Rsa2048,
}

impl KeyType {
    /// Algorithm used for key generation and for certificates this key issues.
    pub const fn signature_algorithm(self) -> SignatureAlgorithm {
        match self {
            KeyType::EcdsaP256 => SignatureAlgorithm::EcdsaSha256,
            KeyType::EcdsaP384 => SignatureAlgorithm::EcdsaSha384,
            KeyType::Rsa2048 => SignatureAlgorithm::RsaPkcs1Sha256,
        }
    }

    fn signature_oid(self) -> Vec<u8> {
        match self {
            KeyType::EcdsaP256 => algorithm_identifier(oid::ECDSA_WITH_SHA256, None),
            KeyType::EcdsaP384 => algorithm_identifier(oid::ECDSA_WITH_SHA384, None),
            KeyType::Rsa2048 => algorithm_identifier(oid::SHA256_WITH_RSA, Some(NULL_PARAMETERS)),
        }
    }

    fn public_key_info(self, public_key: &[u8]) -> Vec<u8> {
        let algorithm = match self {
            KeyType::EcdsaP256 => {
                algorithm_identifier(oid::EC_PUBLIC_KEY, Some(named_curve(oid::PRIME256V1).as_slice()))
            },
            KeyType::EcdsaP384 => {
                algorithm_identifier(oid::EC_PUBLIC_KEY, Some(named_curve(oid::SECP384R1).as_slice()))
            },
            KeyType::Rsa2048 => algorithm_identifier(oid::RSA_ENCRYPTION, Some(NULL_PARAMETERS)),
        };
        let inner = encode(|e| {
            e.raw(&algorithm).bit_string(0, public_key);
        });
        encode(|e| {
            e.sequence(&inner);
        })
    }
}

/// What the certificate is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Usage {
    Ca,
    Server,
    Client,
}

/// A freshly generated certificate and its private key.
#[derive(Clone)]
pub struct GeneratedCertificate {
    /// DER certificate
    pub der: Vec<u8>,
    /// Private key: PKCS#1 DER for RSA, raw scalar for EC
    pub private_key: Zeroizing<Vec<u8>>,
    /// Key pair type
    pub key_type: KeyType,
    subject: Vec<u8>,
}

impl std::fmt::Debug for GeneratedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedCertificate")
            .field("der_len", &self.der.len())
            .field("key_type", &self.key_type)
            .finish()
    }
}

impl GeneratedCertificate {
    /// Subject distinguished name (DER).
    pub fn subject(&self) -> &[u8] {
        &self.subject
    }
}

/// Builder for test certificates.
///
/// ```rust,ignore
/// let provider = RustCryptoProvider::new();
/// let ca = CertificateBuilder::ca("Test Root", KeyType::EcdsaP256)
///     .build_self_signed(&provider)?;
/// let leaf = CertificateBuilder::server("localhost", KeyType::Rsa2048)
///     .with_ip_address("127.0.0.1".parse()?)
///     .build_signed_by(&provider, &ca)?;
/// ```
#[derive(Debug, Clone)]
pub struct CertificateBuilder {
    common_name: String,
    key_type: KeyType,
    usage: Usage,
    dns_names: Vec<String>,
    ip_addresses: Vec<IpAddr>,
    validity: Option<(i64, i64)>,
}

impl CertificateBuilder {
    fn new(common_name: &str, key_type: KeyType, usage: Usage) -> Self {
        Self {
            common_name: common_name.to_string(),
            key_type,
            usage,
            dns_names: Vec::new(),
            ip_addresses: Vec::new(),
            validity: None,
        }
    }

    /// A CA certificate. Carries no subjectAltName.
    pub fn ca(common_name: &str, key_type: KeyType) -> Self {
        Self::new(common_name, key_type, Usage::Ca)
    }

    /// A server certificate. The common name is also its first DNS name.
    pub fn server(common_name: &str, key_type: KeyType) -> Self {
        let mut builder = Self::new(common_name, key_type, Usage::Server);
        builder.dns_names.push(common_name.to_string());
        builder
    }

    /// A client certificate.
    pub fn client(common_name: &str, key_type: KeyType) -> Self {
        Self::new(common_name, key_type, Usage::Client)
    }

    /// Add a DNS subjectAltName.
    pub fn with_dns_name(mut self, name: impl Into<String>) -> Self {
        self.dns_names.push(name.into());
        self
    }

    /// Add an IP subjectAltName.
    pub fn with_ip_address(mut self, ip: IpAddr) -> Self {
        self.ip_addresses.push(ip);
        self
    }

    /// Override the validity window (unix seconds).
    pub fn with_validity(mut self, not_before: i64, not_after: i64) -> Self {
        self.validity = Some((not_before, not_after));
        self
    }

    /// Sign the certificate with its own key.
    pub fn build_self_signed(&self, provider: &dyn CryptoProvider) -> Result<GeneratedCertificate> {
        self.build(provider, None)
    }

    /// Sign the certificate with `issuer`'s key.
    pub fn build_signed_by(
        &self,
        provider: &dyn CryptoProvider,
        issuer: &GeneratedCertificate,
    ) -> Result<GeneratedCertificate> {
        self.build(provider, Some(issuer))
    }

    fn build(
        &self,
        provider: &dyn CryptoProvider,
        issuer: Option<&GeneratedCertificate>,
    ) -> Result<GeneratedCertificate> {
        if self.usage == Usage::Ca && (!self.dns_names.is_empty() || !self.ip_addresses.is_empty()) {
            return Err(Error::InvalidInput("CA certificates carry no subjectAltName".into()));
        }

        let (signing_key, verifying_key) = provider
            .signature(self.key_type.signature_algorithm())?
            .generate_keypair()?;
        let private_key = Zeroizing::new(signing_key.as_bytes().to_vec());

        let subject = name(&self.common_name);
        let (issuer_name, issuer_key, issuer_type) = match issuer {
            Some(ca) => (ca.subject.clone(), ca.private_key.clone(), ca.key_type),
            None => (subject.clone(), private_key.clone(), self.key_type),
        };

        let tbs = self.tbs_certificate(
            provider,
            &issuer_name,
            issuer_type,
            &subject,
            verifying_key.as_bytes(),
        )?;
        let signature = provider
            .signature(issuer_type.signature_algorithm())?
            .sign(&issuer_key, &tbs)?;

        let signature_algorithm = issuer_type.signature_oid();
        let certificate = encode(|e| {
            e.raw(&tbs).raw(&signature_algorithm).bit_string(0, &signature);
        });
        let der = encode(|e| {
            e.sequence(&certificate);
        });

        tracing::debug!(
            "Generated {:?} certificate for {} ({} bytes)",
            self.usage,
            self.common_name,
            der.len()
        );
        Ok(GeneratedCertificate {
            der,
            private_key,
            key_type: self.key_type,
            subject,
        })
    }

    fn tbs_certificate(
        &self,
        provider: &dyn CryptoProvider,
        issuer: &[u8],
        issuer_type: KeyType,
        subject: &[u8],
        public_key: &[u8],
    ) -> Result<Vec<u8>> {
        // positive, sixteen bytes, no leading zero
        let mut serial = provider.random().generate(16)?;
        serial[0] = (serial[0] & 0x7F) | 0x40;

        let now = chrono::Utc::now().timestamp();
        let (not_before, not_after) = self.validity.unwrap_or(match self.usage {
            Usage::Ca => (now - DAY, now + 10 * 365 * DAY),
            Usage::Server | Usage::Client => (now - DAY, now + 365 * DAY),
        });
        let mut validity = Encoder::new();
        validity.time(not_before)?.time(not_after)?;
        let validity = validity.finish();

        let extensions = self.extensions();
        let mut tbs = Encoder::new();
        tbs.context(0, true, &encode(|e| { e.integer(&[2]); }))
            .integer(&serial)
            .raw(&issuer_type.signature_oid())
            .raw(issuer)
            .sequence(&validity)
            .raw(subject)
            .raw(&self.key_type.public_key_info(public_key))
            .context(3, true, &extensions);
        let tbs = tbs.finish();
        Ok(encode(|e| {
            e.sequence(&tbs);
        }))
    }

    fn extensions(&self) -> Vec<u8> {
        let mut list = Encoder::new();
        match self.usage {
            Usage::Ca => {
                let constraints = encode(|e| {
                    e.sequence(&encode(|e| { e.boolean(true); }));
                });
                list.raw(&extension(oid::BASIC_CONSTRAINTS, true, &constraints));
                // keyCertSign | cRLSign
                let usage = encode(|e| { e.bit_string(1, &[0x06]); });
                list.raw(&extension(oid::KEY_USAGE, true, &usage));
            },
            Usage::Server | Usage::Client => {
                let constraints = encode(|e| { e.sequence(&[]); });
                list.raw(&extension(oid::BASIC_CONSTRAINTS, true, &constraints));
                // digitalSignature | keyEncipherment
                let usage = encode(|e| { e.bit_string(5, &[0xA0]); });
                list.raw(&extension(oid::KEY_USAGE, true, &usage));
                let purpose = if self.usage == Usage::Server {
                    oid::SERVER_AUTH
                } else {
                    oid::CLIENT_AUTH
                };
                let purposes = encode(|e| {
                    e.sequence(&encode(|e| { e.oid(purpose); }));
                });
                list.raw(&extension(oid::EXT_KEY_USAGE, false, &purposes));
            },
        }

        if !self.dns_names.is_empty() || !self.ip_addresses.is_empty() {
            let mut names = Encoder::new();
            for dns in &self.dns_names {
                names.context(2, false, dns.as_bytes());
            }
            for ip in &self.ip_addresses {
                match ip {
                    IpAddr::V4(v4) => names.context(7, false, &v4.octets()),
                    IpAddr::V6(v6) => names.context(7, false, &v6.octets()),
                };
            }
            let names = names.finish();
            let san = encode(|e| { e.sequence(&names); });
            list.raw(&extension(oid::SUBJECT_ALT_NAME, false, &san));
        }

        let list = list.finish();
        encode(|e| {
            e.sequence(&list);
        })
    }
}

fn named_curve(curve: &[u8]) -> Vec<u8> {
    encode(|e| {
        e.oid(curve);
    })
}

fn algorithm_identifier(algorithm: &[u8], parameters: Option<&[u8]>) -> Vec<u8> {
    let mut inner = Encoder::new();
    inner.oid(algorithm);
    if let Some(parameters) = parameters {
        inner.raw(parameters);
    }
    let inner = inner.finish();
    encode(|e| {
        e.sequence(&inner);
    })
}

/// `Name` holding a single commonName.
fn name(common_name: &str) -> Vec<u8> {
    let attribute = encode(|e| {
        e.sequence(&encode(|e| {
            e.oid(oid::COMMON_NAME).utf8_string(common_name);
        }));
    });
    let rdn = encode(|e| {
        e.set(&attribute);
    });
    encode(|e| {
        e.sequence(&rdn);
    })
}

fn extension(id: &[u8], critical: bool, value: &[u8]) -> Vec<u8> {
    let mut inner = Encoder::new();
    inner.oid(id);
    if critical {
        inner.boolean(true);
    }
    inner.octet_string(value);
    let inner = inner.finish();
    encode(|e| {
        e.sequence(&inner);
    })
}
