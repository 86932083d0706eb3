//! Engine-agnostic skeleton and world traits.
//!
//! Any articulated-body engine implements [`Skeleton`] for its character and
//! [`PhysicsWorld`] for the scene that owns it. Environments only ever talk to
//! these traits; the kinematic backend in [`crate::kinematic`] is one
//! implementation.

use std::path::Path;

use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};

use drapery_core::error::SimError;

// ---------------------------------------------------------------------------
// Skeleton
// ---------------------------------------------------------------------------

/// Read/write access to an articulated character.
///
/// Bodies are addressed by index in the engine's body-node order; joint
/// coordinates are generalized positions `q` and velocities `dq`.
pub trait Skeleton {
    /// Number of generalized coordinates.
    fn ndofs(&self) -> usize;

    fn positions(&self) -> Vec<f64>;

    fn velocities(&self) -> Vec<f64>;

    /// Overwrite `q`. The slice length must equal [`ndofs`](Self::ndofs).
    fn set_positions(&mut self, q: &[f64]) -> Result<(), SimError>;

    /// Overwrite `dq`. The slice length must equal [`ndofs`](Self::ndofs).
    fn set_velocities(&mut self, dq: &[f64]) -> Result<(), SimError>;

    /// `(lower, upper)` position limit per dof.
    fn position_limits(&self) -> Vec<(f64, f64)>;

    fn num_bodies(&self) -> usize;

    /// Parent body index, `None` for a root body.
    fn parent(&self, body: usize) -> Option<usize>;

    /// World transform of a body frame.
    fn body_transform(&self, body: usize) -> Isometry3<f64>;

    /// World-space centre of mass of a body.
    fn body_com(&self, body: usize) -> Point3<f64>;

    /// Map a body-local point to world space.
    fn to_world(&self, body: usize, local: &Point3<f64>) -> Point3<f64> {
        self.body_transform(body) * local
    }

    /// Map a world point into a body's local frame.
    fn to_local(&self, body: usize, world: &Point3<f64>) -> Point3<f64> {
        self.body_transform(body).inverse_transform_point(world)
    }

    /// Snapshot of `q` and `dq`.
    fn state(&self) -> SkeletonState {
        SkeletonState {
            positions: self.positions(),
            velocities: self.velocities(),
        }
    }

    /// Restore a snapshot taken with [`state`](Self::state).
    fn set_state(&mut self, state: &SkeletonState) -> Result<(), SimError> {
        self.set_positions(&state.positions)?;
        self.set_velocities(&state.velocities)
    }
}

// ---------------------------------------------------------------------------
// PhysicsWorld
// ---------------------------------------------------------------------------

/// A simulated scene holding one controlled character.
pub trait PhysicsWorld {
    type Robot: Skeleton;

    fn robot(&self) -> &Self::Robot;

    fn robot_mut(&mut self) -> &mut Self::Robot;

    /// Restore the scene's initial configuration.
    fn reset(&mut self) -> Result<(), SimError>;

    /// Advance one integration sub-step with the given joint forces.
    fn step(&mut self, tau: &[f64]) -> Result<(), SimError>;

    /// Duration of one sub-step in seconds.
    fn time_step(&self) -> f64;

    /// Move the visual target marker, if the scene has one.
    fn set_marker(&mut self, _position: &Point3<f64>) {}

    /// Human-readable engine name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ---------------------------------------------------------------------------
// SkeletonState
// ---------------------------------------------------------------------------

/// Persisted character state (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkeletonState {
    pub positions: Vec<f64>,
    pub velocities: Vec<f64>,
}

impl SkeletonState {
    /// State at `q` with zero velocity.
    #[must_use]
    pub fn at_rest(positions: Vec<f64>) -> Self {
        let velocities = vec![0.0; positions.len()];
        Self {
            positions,
            velocities,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| SimError::state_file(path, source))?;
        let state: Self =
            serde_json::from_str(&content).map_err(|e| SimError::malformed(path, e.to_string()))?;
        if state.positions.len() != state.velocities.len() {
            return Err(SimError::malformed(
                path,
                format!(
                    "{} positions but {} velocities",
                    state.positions.len(),
                    state.velocities.len()
                ),
            ));
        }
        Ok(state)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        let content =
            serde_json::to_string_pretty(self).map_err(|e| SimError::malformed(path, e.to_string()))?;
        std::fs::write(path, content).map_err(|source| SimError::state_file(path, source))
    }
}

/// Check a coordinate slice against the skeleton's dof count.
pub(crate) fn check_len(what: &str, expected: usize, got: usize) -> Result<(), SimError> {
    if expected == got {
        Ok(())
    } else {
        Err(SimError::StepFailed(format!(
            "{what} has {got} entries, skeleton has {expected} dofs"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
