use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

/// Source of randomness for key derivation.
pub trait EntropySource: Send + Sync {
    fn fill(&mut self, buf: &mut [u8]);
}

/// Operating-system randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

/// Reproducible randomness from a fixed seed. Test and replay use only.
#[derive(Clone, Debug)]
pub struct SeededEntropy(StdRng);

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl EntropySource for SeededEntropy {
    fn fill(&mut self, buf: &mut [u8]) {
        self.0.fill_bytes(buf);
    }
}
