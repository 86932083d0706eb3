//! Termination checks of the dressing task.
//!
//! The checks run in a fixed order and the first one that fires ends the
//! episode: numeric stability, collar containment, then elbow elevation.

use nalgebra::Point3;

use drapery_core::terminations::{StabilityCheck, TerminationCause};
use drapery_physics::feature::ClothFeature;

use super::config::TerminationConfig;

#[derive(Debug, Clone, Copy)]
pub struct DressingTermination {
    stability: StabilityCheck,
    config: TerminationConfig,
}

impl DressingTermination {
    #[must_use]
    pub const fn new(config: TerminationConfig) -> Self {
        Self {
            stability: StabilityCheck::new(config.position_limit),
            config,
        }
    }

    /// Reward returned for any termination.
    pub const fn penalty(&self) -> f64 {
        self.config.penalty
    }

    /// Joint positions past the limit, or any NaN/Inf in the state.
    #[must_use]
    pub fn numeric(&self, q: &[f64], dq: &[f64]) -> Option<TerminationCause> {
        self.stability.check(q, dq)
    }

    /// Collar no longer around the neck or the head.
    ///
    /// Skipped while the cloth is not simulated and during the first
    /// `collar_cooldown` steps.
    #[must_use]
    pub fn collar(
        &self,
        simulate_cloth: bool,
        steps_taken: u32,
        collar: &ClothFeature,
        head_chain: &[Point3<f64>; 3],
    ) -> Option<TerminationCause> {
        if !(self.config.collar && simulate_cloth && self.config.collar_cooldown < steps_taken) {
            return None;
        }
        let [neck, head, top] = head_chain;
        let around_neck = collar.contains(neck, head).0;
        let around_head = collar.contains(head, top).0;
        (!(around_neck || around_head)).then_some(TerminationCause::CollarOff)
    }

    #[must_use]
    pub fn elbow(&self, elevation: f64) -> Option<TerminationCause> {
        (self.config.elbow_elevation && elevation > self.config.elbow_threshold)
            .then_some(TerminationCause::ElbowElevation)
    }
}
