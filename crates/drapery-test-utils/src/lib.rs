//! Shared test fixtures and utilities for drapery crates.
//!
//! Provides deterministic RNG setup, kinematic worlds for both tasks, a
//! synthetic garment and helpers that write reset-state files to disk.

pub mod fixtures;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use fixtures::{
    dressing_world, grid_garment, reacher_world, temp_dir, write_reset_distribution,
};
pub use rng::{deterministic_action, seeded_rng};
