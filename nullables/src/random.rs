//! Nullable random source.

use microcred_crypto::RandomSource;
use std::sync::atomic::{AtomicU8, Ordering};

/// Fills buffers with a counter byte that increases on every call.
///
/// Two consecutive fills never produce the same bytes, which is enough for
/// values that must be unique (nonces, reference ids) but predictable.
#[derive(Debug, Default)]
pub struct NullRandom {
    counter: AtomicU8,
}

impl NullRandom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the sequence at `seed`.
    pub fn starting_at(seed: u8) -> Self {
        Self {
            counter: AtomicU8::new(seed),
        }
    }
}

impl RandomSource for NullRandom {
    fn fill(&self, buf: &mut [u8]) {
        let value = self.counter.fetch_add(1, Ordering::SeqCst);
        buf.fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microcred_crypto::random_hex;

    #[test]
    fn sequence_is_predictable() {
        let rng = NullRandom::starting_at(0xab);
        assert_eq!(random_hex(&rng, 2), "abab");
        assert_eq!(random_hex(&rng, 2), "acac");
    }
}
