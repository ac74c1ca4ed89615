//! Cryptographically secure random number generation from the OS.

use ironwire_crypto::{Error, Random, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random number generator reading from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl Random for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::backend("OS random", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_generation() {
        let rng = OsRandom;

        let mut buf1 = [0u8; 32];
        let mut buf2 = [0u8; 32];

        rng.fill(&mut buf1).unwrap();
        rng.fill(&mut buf2).unwrap();

        assert_ne!(&buf1[..], &[0u8; 32][..]);
        assert_ne!(&buf1[..], &buf2[..]);
    }

    #[test]
    fn test_generate_length() {
        let rng = OsRandom;
        assert_eq!(rng.generate(48).unwrap().len(), 48);
        assert!(rng.generate(0).unwrap().is_empty());
    }
}
