//! Finished message (RFC 5246 Section 7.4.9).

use crate::error::{Error, Result};
use crate::protocol::VERIFY_DATA_SIZE;
use subtle::ConstantTimeEq;

/// Finished message.
///
/// Contains verify_data, a PRF output over the handshake transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    /// Verify data (12 bytes)
    pub verify_data: Vec<u8>,
}

impl Finished {
    /// Create a new Finished.
    pub fn new(verify_data: Vec<u8>) -> Self {
        Self { verify_data }
    }

    /// Encode the body.
    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.verify_data.clone())
    }

    /// Decode the body.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != VERIFY_DATA_SIZE {
            return Err(Error::Framing(format!(
                "Finished must carry {} bytes, got {}",
                VERIFY_DATA_SIZE,
                data.len()
            )));
        }
        Ok(Self {
            verify_data: data.to_vec(),
        })
    }

    /// Compare against locally computed verify data in constant time.
    pub fn verify(&self, expected: &[u8]) -> Result<()> {
        if bool::from(self.verify_data.ct_eq(expected)) {
            Ok(())
        } else {
            Err(Error::FinishedMismatch {
                expected: expected.to_vec(),
                actual: self.verify_data.clone(),
            })
        }
    }
}
