//! Cryptographically Secure Random Number Generator (CSPRNG) interface.

use crate::Result;

/// Random number generator trait.
///
/// # Security Requirements
///
/// - MUST be cryptographically secure
/// - MUST be seeded from an OS entropy source
///
/// ```rust,no_run
/// use ironwire_crypto::Random;
///
/// fn generate_nonce(rng: &dyn Random) -> Vec<u8> {
///     let mut nonce = vec![0u8; 12];
///     rng.fill(&mut nonce).unwrap();
///     nonce
/// }
/// ```
pub trait Random: Send + Sync {
    /// Fill a buffer with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;

    /// Generate a random byte vector of specified length.
    fn generate(&self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.fill(&mut buf)?;
        Ok(buf)
    }
}
