//! ServerKeyExchange for ECDHE (RFC 4492 Section 5.4, RFC 5246 Section 7.4.3).
//!
//! ```text
//! struct {
//!     ECCurveType curve_type;        /* named_curve (3) */
//!     NamedCurve namedcurve;
//! } ECParameters;
//!
//! struct {
//!     ECParameters curve_params;
//!     ECPoint public;                /* opaque point <1..2^8-1> */
//! } ServerECDHParams;
//!
//! struct {
//!     ServerECDHParams params;
//!     digitally-signed struct {
//!         opaque client_random[32];
//!         opaque server_random[32];
//!         ServerECDHParams params;
//!     } signed_params;
//! } ServerKeyExchange;
//! ```

use crate::codec::{put_vec_u16, put_vec_u8, Reader};
use crate::error::{Error, Result};
use crate::protocol::RANDOM_SIZE;
use bytes::BufMut;
use ironwire_crypto::{KeyExchangeAlgorithm, SignatureAlgorithm};

/// ECCurveType value for a named curve.
pub const NAMED_CURVE_TYPE: u8 = 3;

/// SEC1 tag for an uncompressed point.
const UNCOMPRESSED_TAG: u8 = 0x04;

/// Uncompressed EC point, both coordinates padded to the field size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcPoint {
    curve: KeyExchangeAlgorithm,
    /// 0x04 || X || Y
    encoded: Vec<u8>,
}

impl EcPoint {
    /// Build a point from its affine coordinates, left-padding each to
    /// `ceil(field_bits / 8)` bytes.
    pub fn from_coordinates(curve: KeyExchangeAlgorithm, x: &[u8], y: &[u8]) -> Result<Self> {
        let size = curve.coordinate_size();
        let x = strip_leading_zeros(x);
        let y = strip_leading_zeros(y);
        if x.len() > size || y.len() > size {
            return Err(Error::Framing(format!(
                "Coordinate too large for {}",
                curve.name()
            )));
        }

        let mut encoded = vec![0u8; 1 + 2 * size];
        encoded[0] = UNCOMPRESSED_TAG;
        encoded[1 + size - x.len()..1 + size].copy_from_slice(x);
        encoded[1 + 2 * size - y.len()..].copy_from_slice(y);
        Ok(Self { curve, encoded })
    }

    /// Wrap an already encoded SEC1 uncompressed point.
    pub fn from_uncompressed(curve: KeyExchangeAlgorithm, encoded: &[u8]) -> Result<Self> {
        if encoded.first() != Some(&UNCOMPRESSED_TAG) {
            return Err(Error::Framing("point should be uncompressed".into()));
        }
        if encoded.len() != curve.public_key_size() {
            return Err(Error::Framing(format!(
                "{} point must be {} bytes, got {}",
                curve.name(),
                curve.public_key_size(),
                encoded.len()
            )));
        }
        Ok(Self {
            curve,
            encoded: encoded.to_vec(),
        })
    }

    /// Curve this point lies on.
    pub fn curve(&self) -> KeyExchangeAlgorithm {
        self.curve
    }

    /// X coordinate, padded.
    pub fn x(&self) -> &[u8] {
        let size = self.curve.coordinate_size();
        &self.encoded[1..1 + size]
    }

    /// Y coordinate, padded.
    pub fn y(&self) -> &[u8] {
        let size = self.curve.coordinate_size();
        &self.encoded[1 + size..]
    }

    /// SEC1 uncompressed form, as handed to the key agreement.
    pub fn as_bytes(&self) -> &[u8] {
        &self.encoded
    }

    /// Encode as `size:u8 | 0x04 | X | Y`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<()> {
        put_vec_u8(buf, &self.encoded)
    }

    /// Decode `size:u8 | 0x04 | X | Y`.
    pub fn decode(reader: &mut Reader<'_>, curve: KeyExchangeAlgorithm) -> Result<Self> {
        let data = reader.vec_u8("EC point")?;
        Self::from_uncompressed(curve, data)
    }
}

fn strip_leading_zeros(value: &[u8]) -> &[u8] {
    let start = value.iter().position(|&b| b != 0).unwrap_or(value.len());
    &value[start..]
}

/// Curve parameters plus the ephemeral public point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcParameters {
    /// Named curve
    pub curve: KeyExchangeAlgorithm,
    /// Server's ephemeral public key
    pub point: EcPoint,
}

impl EcParameters {
    /// Encode `curve_type | named_curve | point`. These bytes are signed.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(4 + self.point.as_bytes().len());
        buf.put_u8(NAMED_CURVE_TYPE);
        buf.put_u16(self.curve.to_u16());
        self.point.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode the parameters.
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let curve_type = reader.u8("curve type")?;
        if curve_type != NAMED_CURVE_TYPE {
            return Err(Error::Negotiation(format!(
                "Only named curves supported, got curve type {}",
                curve_type
            )));
        }
        let id = reader.u16("named curve")?;
        let curve = KeyExchangeAlgorithm::from_u16(id)
            .ok_or_else(|| Error::Negotiation(format!("Unsupported named curve {}", id)))?;
        let point = EcPoint::decode(reader, curve)?;
        Ok(Self { curve, point })
    }
}

/// ServerKeyExchange message for ECDHE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeyExchange {
    /// Signed parameters
    pub params: EcParameters,
    /// Algorithm of the signature
    pub signature_algorithm: SignatureAlgorithm,
    /// Signature over `client_random || server_random || params`
    pub signature: Vec<u8>,
}

impl ServerKeyExchange {
    /// The bytes covered by the signature.
    pub fn signed_data(
        client_random: &[u8; RANDOM_SIZE],
        server_random: &[u8; RANDOM_SIZE],
        params: &EcParameters,
    ) -> Result<Vec<u8>> {
        let encoded = params.encode()?;
        let mut data = Vec::with_capacity(2 * RANDOM_SIZE + encoded.len());
        data.extend_from_slice(client_random);
        data.extend_from_slice(server_random);
        data.extend_from_slice(&encoded);
        Ok(data)
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = self.params.encode()?;
        buf.put_u16(self.signature_algorithm.to_u16());
        put_vec_u16(&mut buf, &self.signature)?;
        Ok(buf)
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);
        let params = EcParameters::decode(&mut reader)?;
        let code = reader.u16("signature algorithm")?;
        let signature_algorithm = SignatureAlgorithm::from_u16(code).ok_or_else(|| {
            Error::Negotiation(format!("Unknown signature algorithm 0x{:04x}", code))
        })?;
        let signature = reader.vec_u16("signature")?.to_vec();
        reader.finish("ServerKeyExchange")?;

        Ok(Self {
            params,
            signature_algorithm,
            signature,
        })
    }
}
