//! Reward terms of the dressing task.
//!
//! [`DressingRewards`] owns the reward table. Each step it evaluates the
//! enabled terms from a [`RewardInputs`] snapshot, stores them in the table and
//! returns the table total, so the scalar reward and the displayed bars always
//! agree.

use nalgebra::Point3;

use drapery_core::error::ValidationError;
use drapery_core::rewards::RewardTable;

use super::config::{RewardConfig, RewardTermKind};
use super::layout::{HEAD_DOFS, UPRIGHT_DOFS};

/// Distance under which the task bonus is paid.
pub const TASK_BONUS_DISTANCE: f64 = 0.02;
pub const TASK_BONUS: f64 = 0.05;
/// Distance beyond which tiering replaces the target terms.
pub const TIERING_DISTANCE: f64 = 0.1;

/// Everything the reward terms read in one step.
#[derive(Debug, Clone)]
pub struct RewardInputs<'a> {
    pub q: &'a [f64],
    pub rest_pose: &'a [f64],
    pub coms: &'a [Point3<f64>],
    pub rest_coms: &'a [Point3<f64>],
    /// Maximum cloth deformation ratio, zero without cloth.
    pub deformation: f64,
    pub left_target: Point3<f64>,
    pub left_fingertip: Point3<f64>,
    pub right_target: Point3<f64>,
    pub right_fingertip: Point3<f64>,
    pub elbow_elevation: f64,
    pub bicep_alignment: f64,
}

fn joint_sum(q: &[f64], dofs: [usize; 2]) -> f64 {
    dofs.iter().map(|d| q[*d].abs()).sum()
}

/// Soft penalty reaching -1 past a deformation ratio of about 30.
#[must_use]
pub fn deformation_penalty(ratio: f64) -> f64 {
    -((0.14 * (ratio - 25.0)).tanh() + 1.0) / 2.0
}

#[derive(Debug, Clone)]
pub struct DressingRewards {
    kinds: Vec<RewardTermKind>,
    table: RewardTable,
    task_bonus: bool,
    tiering: bool,
    last_deformation: f64,
}

impl DressingRewards {
    #[must_use]
    pub fn new(config: &RewardConfig) -> Self {
        let mut table = RewardTable::new();
        let mut kinds = Vec::with_capacity(config.weights.len());
        for (kind, weight) in &config.weights {
            let (min, max) = kind.display_range(config.task_bonus);
            table = table.with_term(kind.label(), min, max, *weight);
            kinds.push(*kind);
        }
        Self {
            kinds,
            table,
            task_bonus: config.task_bonus,
            tiering: config.target_tiering,
            last_deformation: 0.0,
        }
    }

    pub const fn table(&self) -> &RewardTable {
        &self.table
    }

    pub fn kinds(&self) -> &[RewardTermKind] {
        &self.kinds
    }

    pub fn enabled(&self, kind: RewardTermKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Deformation penalty of the last evaluation, whether or not the term is
    /// in the table.
    pub const fn last_deformation(&self) -> f64 {
        self.last_deformation
    }

    pub fn clear(&mut self) {
        self.table.clear_values();
        self.last_deformation = 0.0;
    }

    /// Evaluate every enabled term and return the weighted total.
    pub fn evaluate(&mut self, inputs: &RewardInputs<'_>) -> Result<f64, ValidationError> {
        self.last_deformation = deformation_penalty(inputs.deformation);
        let values: Vec<f64> = self
            .kinds
            .iter()
            .map(|kind| self.term_value(*kind, inputs))
            .collect();
        self.table.update(&values)?;
        Ok(self.table.total())
    }

    fn term_value(&self, kind: RewardTermKind, inputs: &RewardInputs<'_>) -> f64 {
        let left_distance = (inputs.left_target - inputs.left_fingertip).norm();
        let right_distance = (inputs.right_target - inputs.right_fingertip).norm();
        match kind {
            RewardTermKind::Upright => (-joint_sum(inputs.q, UPRIGHT_DOFS)).max(-2.5),
            RewardTermKind::StableHead => (-joint_sum(inputs.q, HEAD_DOFS)).max(-1.2),
            RewardTermKind::Deformation => self.last_deformation,
            RewardTermKind::RestPose => {
                let distance = inputs
                    .q
                    .iter()
                    .zip(inputs.rest_pose)
                    .map(|(q, r)| (q - r).powi(2))
                    .sum::<f64>()
                    .sqrt();
                (-distance).max(-51.0)
            }
            RewardTermKind::RestComs => {
                let drift: f64 = inputs
                    .coms
                    .iter()
                    .zip(inputs.rest_coms)
                    .map(|(c, r)| (r - c).norm())
                    .sum();
                (-drift).max(-20.0)
            }
            RewardTermKind::LeftTarget => {
                if self.tiering && left_distance > TIERING_DISTANCE {
                    -left_distance - 0.5
                } else {
                    -left_distance
                }
            }
            RewardTermKind::RightTarget => {
                if self.tiering && left_distance > TIERING_DISTANCE {
                    -1.0
                } else if self.tiering && right_distance > TIERING_DISTANCE {
                    -0.5
                } else if self.task_bonus && right_distance < TASK_BONUS_DISTANCE {
                    -right_distance + TASK_BONUS
                } else {
                    -right_distance
                }
            }
            RewardTermKind::RightTargetAltitude => {
                let r = -(inputs.right_target.y - inputs.right_fingertip.y);
                if r > 0.0 { 0.0 } else { r - 0.5 }
            }
            RewardTermKind::ElbowElevation => -inputs.elbow_elevation,
            RewardTermKind::Alive => 1.0,
            RewardTermKind::BicepIn => inputs.bicep_alignment,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
