use crate::error::DraperyError;
use crate::render::{CameraSetup, DrawCommand};
use crate::types::{Action, ActionSpace, ObservationSpace, ResetResult, StepResult};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Gym-style episodic environment.
///
/// The caller drives the loop: `reset` once, then `step` until the returned
/// result reports `done()`, then `reset` again.
pub trait Environment {
    /// Describes the shape and bounds of observations this environment produces.
    fn observation_space(&self) -> ObservationSpace;

    /// Describes the shape and bounds of actions this environment accepts.
    fn action_space(&self) -> ActionSpace;

    /// Start a new episode. A seed reseeds the environment's RNG first.
    fn reset(&mut self, seed: Option<u64>) -> Result<ResetResult, DraperyError>;

    /// Advance the environment by one control step.
    fn step(&mut self, action: &Action) -> Result<StepResult, DraperyError>;

    /// Human-readable name for this environment.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ---------------------------------------------------------------------------
// DebugRender
// ---------------------------------------------------------------------------

/// Optional diagnostic overlay. Never mutates environment state.
pub trait DebugRender {
    /// Initial camera placement.
    fn viewer_setup(&self) -> CameraSetup {
        CameraSetup::default()
    }

    /// Diagnostic primitives for the current state.
    fn extra_render(&self) -> Vec<DrawCommand>;
}
