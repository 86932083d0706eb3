//! Observation layout of the dressing task.

use drapery_core::error::ValidationError;
use drapery_core::types::Observation;

use super::config::{DressingConfig, RewardTermKind};

/// Size of each observation block, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationLayout {
    pub dofs: usize,
    pub prev_action: bool,
    /// Haptic sensors on the garment.
    pub sensors: usize,
    pub haptics: bool,
    pub contact_ids: bool,
    pub right_target: bool,
    pub left_target: bool,
}

/// `[target, fingertip, target - fingertip]`.
pub const TARGET_BLOCK: usize = 9;

impl ObservationLayout {
    #[must_use]
    pub fn new(config: &DressingConfig, dofs: usize, sensors: usize) -> Self {
        Self {
            dofs,
            prev_action: config.observation.prev_action,
            sensors,
            haptics: config.observation.haptics,
            contact_ids: config.observation.contact_ids,
            right_target: config.reward.enabled(RewardTermKind::RightTarget),
            left_target: config.reward.enabled(RewardTermKind::LeftTarget),
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        let mut size = 3 * self.dofs;
        if self.prev_action {
            size += self.dofs;
        }
        if self.haptics {
            size += 3 * self.sensors;
        }
        if self.contact_ids {
            size += self.sensors;
        }
        if self.right_target {
            size += TARGET_BLOCK;
        }
        if self.left_target {
            size += TARGET_BLOCK;
        }
        size
    }

    /// Narrow an assembled vector, rejecting it if its length is off.
    pub fn finish(&self, values: &[f64]) -> Result<Observation, ValidationError> {
        if values.len() != self.size() {
            return Err(ValidationError::ObservationDimMismatch {
                expected: self.size(),
                got: values.len(),
            });
        }
        Ok(Observation::from_f64(values))
    }
}
