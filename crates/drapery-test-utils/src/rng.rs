//! Seeded randomness for reproducible tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use drapery_core::types::Action;

/// `ChaCha8Rng` from a fixed seed, the same generator the environments use.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Action of `dim` components drawn from `[-1, 1)`, i.e. inside the default
/// clamp bounds of both tasks.
pub fn deterministic_action(dim: usize, seed: u64) -> Action {
    let mut rng = seeded_rng(seed);
    Action::new((0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
}
