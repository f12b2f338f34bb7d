//! Stochastic mechanics: seeded RNG helpers for presentation order and
//! simulated observers. All draws go through `bevy_prng::WyRand` so a run
//! is reproducible from its seed.
use bevy_prng::WyRand;
use rand_core::{RngCore, SeedableRng};

/// Fresh generator from a 64-bit seed.
#[inline]
pub fn seeded(seed: u64) -> WyRand {
    WyRand::from_seed(seed.to_le_bytes())
}

/// Uniform in [0, 1) with 53 bits of precision.
#[inline]
pub fn unit(rng: &mut WyRand) -> f64 {
    ((rng.next_u64() >> 11) as f64) / ((1u64 << 53) as f64)
}

/// Bernoulli(p) with WyRand.
#[inline]
pub fn bernoulli(rng: &mut WyRand, p: f64) -> bool {
    unit(rng) < p.clamp(0.0, 1.0)
}

/// Uniform index in `0..n`. `n` must be nonzero.
#[inline]
pub fn below(rng: &mut WyRand, n: usize) -> usize {
    ((unit(rng) * n as f64) as usize).min(n - 1)
}

/// In-place Fisher–Yates shuffle.
pub fn shuffle<T>(rng: &mut WyRand, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = below(rng, i + 1);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_is_a_permutation_and_reproducible() {
        let mut a: Vec<u32> = (0..50).collect();
        let mut b = a.clone();
        shuffle(&mut seeded(7), &mut a);
        shuffle(&mut seeded(7), &mut b);
        assert_eq!(a, b);
        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(a, sorted);
    }

    #[test]
    fn below_stays_in_range() {
        let mut rng = seeded(1);
        for _ in 0..1_000 {
            assert!(below(&mut rng, 3) < 3);
        }
    }
}
