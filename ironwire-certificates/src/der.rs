//! ASN.1 DER writer.
//!
//! Only the shapes an X.509 v3 certificate needs: definite lengths,
//! positive INTEGERs, OIDs given as pre-encoded value bytes, and the two
//! time types.

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Utc};

pub(crate) const TAG_BOOLEAN: u8 = 0x01;
pub(crate) const TAG_INTEGER: u8 = 0x02;
pub(crate) const TAG_BIT_STRING: u8 = 0x03;
pub(crate) const TAG_OCTET_STRING: u8 = 0x04;
pub(crate) const TAG_NULL: u8 = 0x05;
pub(crate) const TAG_OID: u8 = 0x06;
pub(crate) const TAG_UTF8_STRING: u8 = 0x0C;
pub(crate) const TAG_UTC_TIME: u8 = 0x17;
pub(crate) const TAG_GENERALIZED_TIME: u8 = 0x18;
pub(crate) const TAG_SEQUENCE: u8 = 0x30;
pub(crate) const TAG_SET: u8 = 0x31;

/// Builds DER bytes front to back.
#[derive(Debug, Default)]
pub(crate) struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Tag, definite length, value.
    pub(crate) fn tlv(&mut self, tag: u8, value: &[u8]) -> &mut Self {
        self.buf.push(tag);
        self.length(value.len());
        self.buf.extend_from_slice(value);
        self
    }

    fn length(&mut self, length: usize) {
        if length < 0x80 {
            self.buf.push(length as u8);
            return;
        }
        let bytes = length.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        self.buf.push(0x80 | (bytes.len() - skip) as u8);
        self.buf.extend_from_slice(&bytes[skip..]);
    }

    /// Unsigned big-endian integer, minimally encoded.
    pub(crate) fn integer(&mut self, value: &[u8]) -> &mut Self {
        let trimmed = match value.iter().position(|b| *b != 0) {
            Some(first) => &value[first..],
            None => &[0u8][..],
        };
        if trimmed[0] & 0x80 != 0 {
            let mut padded = Vec::with_capacity(trimmed.len() + 1);
            padded.push(0);
            padded.extend_from_slice(trimmed);
            self.tlv(TAG_INTEGER, &padded)
        } else {
            self.tlv(TAG_INTEGER, trimmed)
        }
    }

    pub(crate) fn boolean(&mut self, value: bool) -> &mut Self {
        self.tlv(TAG_BOOLEAN, &[if value { 0xFF } else { 0x00 }])
    }

    pub(crate) fn null(&mut self) -> &mut Self {
        self.tlv(TAG_NULL, &[])
    }

    pub(crate) fn oid(&mut self, value: &[u8]) -> &mut Self {
        self.tlv(TAG_OID, value)
    }

    pub(crate) fn octet_string(&mut self, value: &[u8]) -> &mut Self {
        self.tlv(TAG_OCTET_STRING, value)
    }

    pub(crate) fn bit_string(&mut self, unused_bits: u8, value: &[u8]) -> &mut Self {
        let mut content = Vec::with_capacity(value.len() + 1);
        content.push(unused_bits);
        content.extend_from_slice(value);
        self.tlv(TAG_BIT_STRING, &content)
    }

    pub(crate) fn utf8_string(&mut self, value: &str) -> &mut Self {
        self.tlv(TAG_UTF8_STRING, value.as_bytes())
    }

    pub(crate) fn sequence(&mut self, contents: &[u8]) -> &mut Self {
        self.tlv(TAG_SEQUENCE, contents)
    }

    pub(crate) fn set(&mut self, contents: &[u8]) -> &mut Self {
        self.tlv(TAG_SET, contents)
    }

    /// Context-specific tag `[number]`.
    pub(crate) fn context(&mut self, number: u8, constructed: bool, contents: &[u8]) -> &mut Self {
        let tag = 0x80 | if constructed { 0x20 } else { 0 } | (number & 0x1F);
        self.tlv(tag, contents)
    }

    /// Already encoded DER.
    pub(crate) fn raw(&mut self, der: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(der);
        self
    }

    /// RFC 5280 Time: UTCTime through 2049, GeneralizedTime after.
    pub(crate) fn time(&mut self, unix_seconds: i64) -> Result<&mut Self> {
        let time = DateTime::<Utc>::from_timestamp(unix_seconds, 0)
            .ok_or_else(|| Error::InvalidInput(format!("Timestamp {} out of range", unix_seconds)))?;
        if (1950..2050).contains(&time.year()) {
            let text = time.format("%y%m%d%H%M%SZ").to_string();
            Ok(self.tlv(TAG_UTC_TIME, text.as_bytes()))
        } else {
            let text = time.format("%Y%m%d%H%M%SZ").to_string();
            Ok(self.tlv(TAG_GENERALIZED_TIME, text.as_bytes()))
        }
    }
}

/// Encode one value with a fresh encoder.
pub(crate) fn encode(build: impl FnOnce(&mut Encoder)) -> Vec<u8> {
    let mut encoder = Encoder::new();
    build(&mut encoder);
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_lengths() {
        assert_eq!(encode(|e| { e.octet_string(&[1, 2]); }), [0x04, 2, 1, 2]);

        let long = encode(|e| {
            e.octet_string(&[0u8; 200]);
        });
        assert_eq!(&long[..3], &[0x04, 0x81, 200]);

        let longer = encode(|e| {
            e.octet_string(&[0u8; 300]);
        });
        assert_eq!(&longer[..4], &[0x04, 0x82, 0x01, 0x2C]);
    }

    #[test]
    fn test_integers_stay_positive() {
        assert_eq!(encode(|e| { e.integer(&[0x80]); }), [0x02, 2, 0x00, 0x80]);
        assert_eq!(encode(|e| { e.integer(&[0, 0, 0x05]); }), [0x02, 1, 0x05]);
        assert_eq!(encode(|e| { e.integer(&[0, 0]); }), [0x02, 1, 0x00]);
    }

    #[test]
    fn test_time_forms() {
        // 2001-09-09 01:46:40 UTC
        let mut e = Encoder::new();
        e.time(1_000_000_000).unwrap();
        assert_eq!(e.finish(), [&[0x17, 13][..], b"010909014640Z"].concat());

        // 2065-01-24 05:20:00 UTC
        let mut e = Encoder::new();
        e.time(3_000_000_000).unwrap();
        assert_eq!(e.finish(), [&[0x18, 15][..], b"20650124052000Z"].concat());
    }
}
