// drapery-core: Types, traits, config, reward tables, manifests and errors for
// drapery environments.

pub mod config;
pub mod error;
pub mod manifest;
pub mod render;
pub mod rewards;
pub mod seed;
pub mod terminations;
pub mod traits;
pub mod types;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        config::ActionConfig,
        error::{ConfigError, DraperyError, ManifestError, SimError, ValidationError},
        manifest::{ManifestEntry, ResetManifest},
        render::{CameraSetup, Color, DrawCommand},
        rewards::{RewardTable, RewardTerm},
        seed::SeedHierarchy,
        terminations::{StabilityCheck, TerminationCause},
        traits::{DebugRender, Environment},
        types::{
            Action, ActionSpace, Observation, ObservationSpace, ResetInfo, ResetResult,
            StepInfo, StepResult,
        },
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_exports() {
        fn _accepts_env(_: &dyn Environment) {}
        let _table = RewardTable::new().with_term("alive", 0.0, 1.0, 1.0);
        let _check = StabilityCheck::default();
        let _seeds = SeedHierarchy::new(0);
    }
}
