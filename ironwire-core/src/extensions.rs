//! Hello extensions used by TLS 1.2.
//!
//! - `server_name` (SNI) - RFC 6066
//! - `elliptic_curves` - RFC 4492 (named curves for ECDHE)
//! - `ec_point_formats` - RFC 4492 (uncompressed only)
//! - `signature_algorithms` - RFC 5246 Section 7.4.1.4.1
//!
//! Wire form of the block:
//!
//! ```text
//! uint16 total_length;
//! struct { uint16 type; opaque data<0..2^16-1>; } extensions[];
//! ```
//!
//! Unknown extensions are carried through decoding untouched and ignored by
//! the handshake.

use crate::codec::{put_vec_u16, put_vec_u8, Reader};
use crate::error::{Error, Result};
use bytes::BufMut;
use ironwire_crypto::{KeyExchangeAlgorithm, SignatureAlgorithm};

/// SNI name type for DNS host names.
const HOST_NAME_TYPE: u8 = 0;

/// The only point format we produce or accept.
pub const POINT_FORMAT_UNCOMPRESSED: u8 = 0;

/// Extension type codes understood by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ExtensionType {
    /// server_name
    ServerName = 0,
    /// elliptic_curves (renamed supported_groups later)
    EllipticCurves = 10,
    /// ec_point_formats
    EcPointFormats = 11,
    /// signature_algorithms
    SignatureAlgorithms = 13,
}

impl ExtensionType {
    /// Wire code.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

/// One raw extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    /// Extension type code (possibly one we do not know)
    pub extension_type: u16,
    /// Extension body
    pub data: Vec<u8>,
}

impl Extension {
    /// Create an extension of a known type.
    pub fn new(extension_type: ExtensionType, data: Vec<u8>) -> Self {
        Self {
            extension_type: extension_type.to_u16(),
            data,
        }
    }
}

/// Ordered extension block of a hello message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extensions {
    entries: Vec<Extension>,
}

impl Extensions {
    /// Empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extension.
    pub fn push(&mut self, extension: Extension) {
        self.entries.push(extension);
    }

    /// Body of the first extension of `extension_type`.
    pub fn get(&self, extension_type: ExtensionType) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.extension_type == extension_type.to_u16())
            .map(|e| e.data.as_slice())
    }

    /// All extensions in order.
    pub fn iter(&self) -> impl Iterator<Item = &Extension> {
        self.entries.iter()
    }

    /// Whether the block carries no extensions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the block. An empty block is omitted entirely.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        let mut body = Vec::new();
        for ext in &self.entries {
            body.put_u16(ext.extension_type);
            put_vec_u16(&mut body, &ext.data)?;
        }
        put_vec_u16(buf, &body)
    }

    /// Decode the trailing extension block of a hello. Absent means empty.
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let mut extensions = Self::new();
        if reader.is_empty() {
            return Ok(extensions);
        }

        let mut block = Reader::new(reader.vec_u16("extensions")?);
        while !block.is_empty() {
            let extension_type = block.u16("extension type")?;
            let data = block.vec_u16("extension data")?.to_vec();
            if extensions.entries.iter().any(|e| e.extension_type == extension_type) {
                return Err(Error::Framing(format!(
                    "Duplicate extension {}",
                    extension_type
                )));
            }
            extensions.entries.push(Extension {
                extension_type,
                data,
            });
        }
        Ok(extensions)
    }

    /// Requested server name, if the peer sent SNI.
    pub fn server_name(&self) -> Result<Option<String>> {
        self.get(ExtensionType::ServerName)
            .map(parse_server_name)
            .transpose()
    }

    /// Advertised signature algorithms, if present.
    pub fn signature_algorithms(&self) -> Result<Option<Vec<SignatureAlgorithm>>> {
        self.get(ExtensionType::SignatureAlgorithms)
            .map(parse_signature_algorithms)
            .transpose()
    }

    /// Advertised named curves, if present.
    pub fn elliptic_curves(&self) -> Result<Option<Vec<KeyExchangeAlgorithm>>> {
        self.get(ExtensionType::EllipticCurves)
            .map(parse_elliptic_curves)
            .transpose()
    }

    /// Advertised point formats, if present.
    pub fn ec_point_formats(&self) -> Result<Option<Vec<u8>>> {
        self.get(ExtensionType::EcPointFormats)
            .map(parse_ec_point_formats)
            .transpose()
    }
}

/// Create a `server_name` extension carrying one host name.
pub fn server_name_extension(hostname: &str) -> Result<Extension> {
    if hostname.is_empty() {
        return Err(Error::InvalidConfig("Empty server name".into()));
    }
    let mut entry = Vec::with_capacity(hostname.len() + 3);
    entry.put_u8(HOST_NAME_TYPE);
    put_vec_u16(&mut entry, hostname.as_bytes())?;

    let mut data = Vec::with_capacity(entry.len() + 2);
    put_vec_u16(&mut data, &entry)?;
    Ok(Extension::new(ExtensionType::ServerName, data))
}

/// Parse `server_name`, returning the first host name entry.
pub fn parse_server_name(data: &[u8]) -> Result<String> {
    let mut outer = Reader::new(data);
    let mut list = Reader::new(outer.vec_u16("server_name list")?);
    outer.finish("server_name")?;

    while !list.is_empty() {
        let name_type = list.u8("server_name type")?;
        let name = list.vec_u16("server_name entry")?;
        if name_type == HOST_NAME_TYPE {
            return String::from_utf8(name.to_vec())
                .map_err(|_| Error::Framing("server_name is not UTF-8".into()));
        }
    }
    Err(Error::Framing("server_name carries no host name".into()))
}

/// Create a `signature_algorithms` extension.
pub fn signature_algorithms_extension(algorithms: &[SignatureAlgorithm]) -> Result<Extension> {
    let mut list = Vec::with_capacity(algorithms.len() * 2);
    for alg in algorithms {
        list.put_u16(alg.to_u16());
    }
    let mut data = Vec::with_capacity(list.len() + 2);
    put_vec_u16(&mut data, &list)?;
    Ok(Extension::new(ExtensionType::SignatureAlgorithms, data))
}

/// Parse `signature_algorithms`. Unknown (hash, signature) pairs are skipped.
pub fn parse_signature_algorithms(data: &[u8]) -> Result<Vec<SignatureAlgorithm>> {
    let mut outer = Reader::new(data);
    let list = outer.vec_u16("signature_algorithms")?;
    outer.finish("signature_algorithms")?;
    if list.len() % 2 != 0 {
        return Err(Error::Framing(
            "signature_algorithms list has odd length".into(),
        ));
    }
    Ok(list
        .chunks_exact(2)
        .filter_map(|pair| SignatureAlgorithm::from_u16(u16::from_be_bytes([pair[0], pair[1]])))
        .collect())
}

/// Create an `elliptic_curves` extension.
pub fn elliptic_curves_extension(curves: &[KeyExchangeAlgorithm]) -> Result<Extension> {
    let mut list = Vec::with_capacity(curves.len() * 2);
    for curve in curves {
        list.put_u16(curve.to_u16());
    }
    let mut data = Vec::with_capacity(list.len() + 2);
    put_vec_u16(&mut data, &list)?;
    Ok(Extension::new(ExtensionType::EllipticCurves, data))
}

/// Parse `elliptic_curves`. Unknown curves are skipped.
pub fn parse_elliptic_curves(data: &[u8]) -> Result<Vec<KeyExchangeAlgorithm>> {
    let mut outer = Reader::new(data);
    let list = outer.vec_u16("elliptic_curves")?;
    outer.finish("elliptic_curves")?;
    if list.len() % 2 != 0 {
        return Err(Error::Framing("elliptic_curves list has odd length".into()));
    }
    Ok(list
        .chunks_exact(2)
        .filter_map(|c| KeyExchangeAlgorithm::from_u16(u16::from_be_bytes([c[0], c[1]])))
        .collect())
}

/// Create an `ec_point_formats` extension offering uncompressed points only.
pub fn ec_point_formats_extension() -> Result<Extension> {
    let mut data = Vec::with_capacity(2);
    put_vec_u8(&mut data, &[POINT_FORMAT_UNCOMPRESSED])?;
    Ok(Extension::new(ExtensionType::EcPointFormats, data))
}

/// Parse `ec_point_formats`.
pub fn parse_ec_point_formats(data: &[u8]) -> Result<Vec<u8>> {
    let mut outer = Reader::new(data);
    let formats = outer.vec_u8("ec_point_formats")?.to_vec();
    outer.finish("ec_point_formats")?;
    Ok(formats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_name_wire_form() {
        let ext = server_name_extension("example.com").unwrap();
        assert_eq!(ext.extension_type, 0);
        assert_eq!(&ext.data[..5], &[0x00, 0x0e, 0x00, 0x00, 0x0b]);
        assert_eq!(parse_server_name(&ext.data).unwrap(), "example.com");
    }

    #[test]
    fn test_block_encoding_and_lookup() {
        let mut exts = Extensions::new();
        exts.push(ec_point_formats_extension().unwrap());
        exts.push(
            elliptic_curves_extension(&[
                KeyExchangeAlgorithm::Secp256r1,
                KeyExchangeAlgorithm::Secp384r1,
            ])
            .unwrap(),
        );

        let mut buf = Vec::new();
        exts.encode(&mut buf).unwrap();
        // total length, then ec_point_formats(11) with 2 bytes of data
        assert_eq!(&buf[..8], &[0x00, 0x10, 0x00, 0x0b, 0x00, 0x02, 0x01, 0x00]);

        let decoded = Extensions::decode(&mut Reader::new(&buf)).unwrap();
        assert_eq!(decoded.ec_point_formats().unwrap(), Some(vec![0]));
        assert_eq!(
            decoded.elliptic_curves().unwrap(),
            Some(vec![
                KeyExchangeAlgorithm::Secp256r1,
                KeyExchangeAlgorithm::Secp384r1
            ])
        );
        assert_eq!(decoded.signature_algorithms().unwrap(), None);
    }

    #[test]
    fn test_empty_block_omitted_and_absent_block_is_empty() {
        let mut buf = Vec::new();
        Extensions::new().encode(&mut buf).unwrap();
        assert!(buf.is_empty());
        assert!(Extensions::decode(&mut Reader::new(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_entries_skipped() {
        // 0x0403 = ecdsa_secp256r1_sha256, 0x0807 = ed25519 (unknown here)
        let data = [0x00, 0x04, 0x04, 0x03, 0x08, 0x07];
        assert_eq!(
            parse_signature_algorithms(&data).unwrap(),
            vec![SignatureAlgorithm::EcdsaSha256]
        );

        let mut buf = Vec::new();
        let mut exts = Extensions::new();
        exts.push(Extension {
            extension_type: 0xff01,
            data: vec![0],
        });
        exts.encode(&mut buf).unwrap();
        let decoded = Extensions::decode(&mut Reader::new(&buf)).unwrap();
        assert_eq!(decoded.iter().count(), 1);
        assert_eq!(decoded.server_name().unwrap(), None);
    }

    #[test]
    fn test_duplicate_and_truncated_rejected() {
        let dup = [0x00, 0x08, 0x00, 0x0b, 0x00, 0x00, 0x00, 0x0b, 0x00, 0x00];
        assert!(Extensions::decode(&mut Reader::new(&dup)).is_err());

        let short = [0x00, 0x06, 0x00, 0x0b, 0x00, 0x05, 0x01];
        assert!(Extensions::decode(&mut Reader::new(&short))
            .unwrap_err()
            .is_framing());
    }
}
