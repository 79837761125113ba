//! Randomness for nonces, reference ids and ephemeral secrets.

use rand::rngs::OsRng;
use rand::RngCore;

/// Source of unpredictable bytes.
///
/// Production code uses [`OsRandom`]; tests swap in a deterministic source.
pub trait RandomSource: Send + Sync {
    fn fill(&self, buf: &mut [u8]);
}

/// The operating system CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }
}

/// `len` random bytes, hex encoded (`2 * len` lowercase characters).
pub fn random_hex(source: &dyn RandomSource, len: usize) -> String {
    let mut buf = vec![0u8; len];
    source.fill(&mut buf);
    hex::encode(buf)
}
