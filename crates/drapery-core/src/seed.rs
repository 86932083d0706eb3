//! Deterministic seed derivation for reproducible rollouts.
//!
//! ```text
//! Run seed
//! └── Env seed (per environment instance)
//!     └── Episode seed (per episode within an env)
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Derive a child seed from a parent seed and a numeric index.
///
/// # Example
///
/// ```
/// use drapery_core::seed::derive_seed_indexed;
///
/// let s0 = derive_seed_indexed(42, 0);
/// let s1 = derive_seed_indexed(42, 1);
/// assert_ne!(s0, s1);
/// assert_eq!(s0, derive_seed_indexed(42, 0));
/// ```
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// Seed tree rooted at a single run seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedHierarchy {
    root: u64,
}

impl SeedHierarchy {
    #[must_use]
    pub const fn new(root: u64) -> Self {
        Self { root }
    }

    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    #[must_use]
    pub fn env_seed(&self, env_index: u16) -> u64 {
        derive_seed_indexed(self.root, u64::from(env_index))
    }

    /// Seed handed to `Environment::reset` for one episode.
    #[must_use]
    pub fn episode_seed(&self, env_index: u16, episode_number: u64) -> u64 {
        derive_seed_indexed(self.env_seed(env_index), episode_number)
    }

    /// RNG for a policy or other consumer tied to the run.
    #[must_use]
    pub fn root_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn episode_seeds_differ_between_episodes() {
        let seeds = SeedHierarchy::new(7);
        assert_ne!(seeds.episode_seed(0, 0), seeds.episode_seed(0, 1));
        assert_ne!(seeds.episode_seed(0, 0), seeds.episode_seed(1, 0));
    }

    #[test]
    fn episode_seeds_are_reproducible() {
        let a = SeedHierarchy::new(7);
        let b = SeedHierarchy::new(7);
        assert_eq!(a.episode_seed(2, 9), b.episode_seed(2, 9));
    }

    #[test]
    fn root_rng_is_deterministic() {
        let seeds = SeedHierarchy::new(42);
        let x: f64 = seeds.root_rng().r#gen();
        let y: f64 = seeds.root_rng().r#gen();
        assert!((x - y).abs() < f64::EPSILON);
        assert_eq!(seeds.root(), 42);
    }
}
