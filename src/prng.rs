//! Deterministic per-ray scalar random stream (component C1).
//!
//! `Prng` wraps a PCG generator seeded from a single 32-bit integer. Any
//! two `Prng`s constructed with the same seed produce the same sequence of
//! `uniform()` draws, on any platform — reproducibility of the noise
//! pattern, not bit-for-bit compatibility with any particular reference
//! implementation.

use rand_core::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

/// Deterministic scalar generator. One `Prng` is constructed per traced
/// ray, seeded with `baseSeed + k` (see `Tracer`), so the noise pattern is
/// stationary across runs and independent of thread scheduling.
pub struct Prng {
    rng: Pcg32,
}

impl Prng {
    pub fn new(seed: u32) -> Self {
        Prng {
            rng: Pcg32::seed_from_u64(seed as u64),
        }
    }

    pub fn reseed(&mut self, seed: u32) {
        self.rng = Pcg32::seed_from_u64(seed as u64);
    }

    /// Uniform double in `[0, 1)`.
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        // 53 bits of entropy from two 32-bit draws, scaled into [0, 1).
        let hi = self.rng.next_u32() as u64;
        let lo = self.rng.next_u32() as u64;
        let bits = (hi << 32) | lo;
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform double in `[a, b)`.
    #[inline]
    pub fn uniform_range(&mut self, a: f64, b: f64) -> f64 {
        a + self.uniform() * (b - a)
    }
}
