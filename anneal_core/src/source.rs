//! Seeded uniform randomness for the initial configuration.

use crate::grid::{ALIVE, DEAD};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Default seed for the initial configuration.
pub const DEFAULT_SEED: u64 = 424243;

/// A stream of uniform doubles in `[0, 1)`.
pub trait UniformSource {
    /// Returns the next value of the stream.
    fn next_uniform(&mut self) -> f64;
}

/// ChaCha8-backed uniform source. Same seed, same stream.
#[derive(Debug, Clone)]
pub struct SeededUniform {
    seed: u64,
    rng: ChaCha8Rng,
}

impl SeededUniform {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Restarts the stream from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl UniformSource for SeededUniform {
    fn next_uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Draws one cell: alive with probability one half.
pub fn random_cell<S: UniformSource + ?Sized>(source: &mut S) -> u8 {
    if (source.next_uniform() * 100.0) as u32 >= 50 {
        ALIVE
    } else {
        DEAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = SeededUniform::new(7);
        let mut b = SeededUniform::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_uniform(), b.next_uniform());
        }
    }

    #[test]
    fn test_reseed_restarts() {
        let mut a = SeededUniform::new(1);
        let first: Vec<f64> = (0..5).map(|_| a.next_uniform()).collect();
        a.reseed(1);
        let again: Vec<f64> = (0..5).map(|_| a.next_uniform()).collect();
        assert_eq!(first, again);
        assert_eq!(a.seed(), 1);
    }

    #[test]
    fn test_values_in_unit_interval() {
        let mut source = SeededUniform::new(DEFAULT_SEED);
        for _ in 0..10_000 {
            let u = source.next_uniform();
            assert!((0.0..1.0).contains(&u));
        }
    }

    #[test]
    fn test_random_cell_is_roughly_fair() {
        let mut source = SeededUniform::new(DEFAULT_SEED);
        let alive = (0..20_000).filter(|_| random_cell(&mut source) == ALIVE).count();
        assert!((9_000..11_000).contains(&alive), "alive = {}", alive);
    }

    struct Fixed(f64);

    impl UniformSource for Fixed {
        fn next_uniform(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_random_cell_threshold() {
        assert_eq!(random_cell(&mut Fixed(0.499)), DEAD);
        assert_eq!(random_cell(&mut Fixed(0.5)), ALIVE);
        assert_eq!(random_cell(&mut Fixed(0.0)), DEAD);
    }
}
