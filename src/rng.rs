//! The RNG facility (§4.2): every connection owns a seedable CSPRNG. Draws
//! are linearly threaded -- each call atomically replaces the generator
//! state in the session, never leaving a stale copy lying around to be
//! accidentally reused.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Deterministic-on-seed pseudo-random byte source.
///
/// Given identical seeds and identical call sequences, `fill` produces
/// bit-identical output (property I3) -- this is what makes the anti-
/// rollback countermeasure and the end-to-end tests in §8 reproducible.
#[derive(Clone)]
pub struct RandomGen {
    inner: ChaCha20Rng,
}

impl RandomGen {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        RandomGen {
            inner: ChaCha20Rng::from_seed(seed),
        }
    }

    /// Seeds from the OS RNG once; all subsequent draws on this connection
    /// are then deterministic functions of that single seed and the call
    /// sequence, per the "no global RNG" design note.
    pub fn from_entropy() -> Self {
        RandomGen {
            inner: ChaCha20Rng::from_entropy(),
        }
    }

    /// Draw N bytes, replacing `self` with the advanced generator state.
    pub fn fill(&mut self, out: &mut [u8]) {
        self.inner.fill_bytes(out);
    }

    pub fn draw(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        self.fill(&mut out);
        out
    }

    /// Runs an arbitrary RNG-consuming computation and commits its
    /// post-state -- used by the RSA blinding primitive, which needs a
    /// `RngCore` it can draw from an unbounded number of times.
    pub fn with_rng<T>(&mut self, f: impl FnOnce(&mut ChaCha20Rng) -> T) -> T {
        f(&mut self.inner)
    }
}

impl std::fmt::Debug for RandomGen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RandomGen(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_output() {
        let mut a = RandomGen::from_seed([7u8; 32]);
        let mut b = RandomGen::from_seed([7u8; 32]);
        assert_eq!(a.draw(48), b.draw(48));
        // continuing to draw keeps them in lock-step too.
        assert_eq!(a.draw(16), b.draw(16));
    }

    #[test]
    fn different_seed_different_output() {
        let mut a = RandomGen::from_seed([7u8; 32]);
        let mut b = RandomGen::from_seed([8u8; 32]);
        assert_ne!(a.draw(48), b.draw(48));
    }
}
