//! Server identity checks against certificate subjectAltNames.
//!
//! Host names are compared label by label from the top-level domain down.
//! A `*` label in the certificate stands for exactly one label of the name,
//! and is only honoured when at least two concrete labels matched as well,
//! so `*.com` never matches anything.
//!
//! A certificate without any subjectAltName is accepted for any name.

use crate::error::{Result, VerificationError};
use crate::x509::PeerCertificate;
use std::net::IpAddr;

/// Check that `cert` was issued for `expected` (host name or IP literal).
pub fn verify_hostname(expected: &str, cert: &PeerCertificate) -> Result<()> {
    if !cert.has_subject_alt_names() {
        tracing::debug!("Certificate has no subjectAltName, skipping host name check");
        return Ok(());
    }

    let matched = if expected.parse::<IpAddr>().is_ok() {
        cert.ip_addresses()
            .iter()
            .any(|ip| ip.to_string() == expected)
    } else {
        cert.dns_names()
            .iter()
            .any(|pattern| matches_hostname(expected, pattern))
    };

    if matched {
        Ok(())
    } else {
        Err(VerificationError::HostnameMismatch(format!(
            "certificate is not valid for {}",
            expected
        ))
        .into())
    }
}

/// Match a host name against one DNS subjectAltName pattern.
pub fn matches_hostname(name: &str, pattern: &str) -> bool {
    let name_labels = reversed_labels(name);
    let pattern_labels = reversed_labels(pattern);

    if name_labels.len() != pattern_labels.len() || name_labels.is_empty() {
        return false;
    }

    let mut wildcard_found = false;
    let mut concrete_matches = 0;
    for (label, expected) in name_labels.iter().zip(pattern_labels.iter()) {
        if label.is_empty() {
            return false;
        }
        if *expected == "*" {
            if wildcard_found {
                return false;
            }
            wildcard_found = true;
        } else if label.eq_ignore_ascii_case(expected) {
            concrete_matches += 1;
        } else {
            return false;
        }
    }

    !wildcard_found || concrete_matches >= 2
}

/// Labels from the TLD down, ignoring the empty label of a trailing dot.
fn reversed_labels(name: &str) -> Vec<&str> {
    let mut labels = name.split('.').rev().peekable();
    if labels.peek() == Some(&"") {
        labels.next();
    }
    labels.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ironwire_certificates::{CertificateBuilder, KeyType};
    use ironwire_crypto_rustcrypto::RustCryptoProvider;

    #[test]
    fn test_wildcard_single_label() {
        assert!(matches_hostname("a.example.com", "*.example.com"));
        assert!(!matches_hostname("a.b.example.com", "*.example.com"));
        assert!(!matches_hostname("example.com", "*.example.com"));
    }

    #[test]
    fn test_wildcard_needs_two_concrete_labels() {
        assert!(!matches_hostname("example.com", "*.com"));
        assert!(!matches_hostname("a.b", "*.*"));
    }

    #[test]
    fn test_case_insensitive_and_trailing_dot() {
        assert!(matches_hostname("X.com", "x.com"));
        assert!(matches_hostname("www.example.com.", "www.example.com"));
        assert!(matches_hostname("www.example.com", "WWW.Example.COM."));
        assert!(!matches_hostname("www.example.org", "www.example.com"));
        assert!(!matches_hostname("a..example.com", "a..example.com"));
    }

    #[test]
    fn test_certificate_names() {
        let provider = RustCryptoProvider::new();
        let cert = CertificateBuilder::server("server.test", KeyType::EcdsaP256)
            .with_dns_name("*.apps.server.test")
            .with_ip_address("127.0.0.1".parse().unwrap())
            .build_self_signed(&provider)
            .expect("Failed to build certificate");
        let cert = PeerCertificate::from_der(&cert.der).unwrap();

        verify_hostname("server.test", &cert).unwrap();
        verify_hostname("one.apps.server.test", &cert).unwrap();
        verify_hostname("127.0.0.1", &cert).unwrap();
        assert!(matches!(
            verify_hostname("127.0.0.2", &cert),
            Err(Error::Verification(VerificationError::HostnameMismatch(_)))
        ));
        assert!(verify_hostname("other.test", &cert).is_err());
    }

    #[test]
    fn test_no_san_is_lenient() {
        let provider = RustCryptoProvider::new();
        let cert = CertificateBuilder::ca("Bare Root", KeyType::EcdsaP256)
            .build_self_signed(&provider)
            .expect("Failed to build certificate");
        let cert = PeerCertificate::from_der(&cert.der).unwrap();
        assert!(!cert.has_subject_alt_names());
        verify_hostname("anything.example", &cert).unwrap();
    }
}
