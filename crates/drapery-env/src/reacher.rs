//! Arm reaching toward a random 3D target.
//!
//! Each step the raw action is clamped and scaled into joint torques, the
//! world is advanced `frame_skip` sub-steps, and the reward measures how far
//! the fingertip moved toward the target.

use std::path::Path;

use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use drapery_core::config::{ActionConfig, load_toml};
use drapery_core::error::{ConfigError, DraperyError, ValidationError};
use drapery_core::render::{CameraSetup, Color, DrawCommand};
use drapery_core::rewards::RewardTable;
use drapery_core::terminations::TerminationCause;
use drapery_core::traits::{DebugRender, Environment};
use drapery_core::types::{
    Action, ActionSpace, Observation, ObservationSpace, ResetInfo, ResetResult, StepInfo,
    StepResult,
};
use drapery_physics::backend::{PhysicsWorld, Skeleton};

use crate::episode::Episode;
use crate::to_array;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_action() -> ActionConfig {
    ActionConfig::uniform(5, 1.0, 10.0)
}
const fn default_frame_skip() -> u32 {
    4
}
const fn default_fingertip_body() -> usize {
    2
}
const fn default_fingertip_offset() -> [f64; 3] {
    [0.0, -0.25, 0.0]
}
const fn default_distance_threshold() -> f64 {
    0.1
}
const fn default_termination_penalty() -> f64 {
    -2500.0
}
const fn default_reset_noise() -> f64 {
    0.01
}
const fn default_target_bound() -> f64 {
    1.0
}
const fn default_target_max_norm() -> f64 {
    1.5
}

/// Smallest `target_max_norm / target_bound` accepted; bounds the expected
/// number of target draws per reset.
const MIN_TARGET_NORM_RATIO: f64 = 0.1;

// ---------------------------------------------------------------------------
// DistanceTermination
// ---------------------------------------------------------------------------

/// When the fingertip distance ends an episode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceTermination {
    /// End as soon as the fingertip is within the threshold.
    #[default]
    WithinThreshold,
    /// End when the fingertip is farther than the threshold.
    BeyondThreshold,
}

impl DistanceTermination {
    /// Whether a fingertip `distance` from the target ends the episode.
    #[must_use]
    pub fn fires(self, distance: f64, threshold: f64) -> bool {
        match self {
            Self::WithinThreshold => !(distance > threshold),
            Self::BeyondThreshold => distance > threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// ReacherConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReacherConfig {
    #[serde(default = "default_action")]
    pub action: ActionConfig,

    /// Sub-steps per control step.
    #[serde(default = "default_frame_skip")]
    pub frame_skip: u32,

    #[serde(default = "default_fingertip_body")]
    pub fingertip_body: usize,

    /// Fingertip in the fingertip body's frame.
    #[serde(default = "default_fingertip_offset")]
    pub fingertip_offset: [f64; 3],

    #[serde(default)]
    pub termination: DistanceTermination,

    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f64,

    /// Reward returned when the state stops being finite.
    #[serde(default = "default_termination_penalty")]
    pub termination_penalty: f64,

    /// Half-width of the uniform noise added to `q` and `dq` on reset.
    #[serde(default = "default_reset_noise")]
    pub reset_noise: f64,

    /// Targets are drawn from `[-target_bound, target_bound]^3` ...
    #[serde(default = "default_target_bound")]
    pub target_bound: f64,

    /// ... and redrawn until their norm is below this.
    #[serde(default = "default_target_max_norm")]
    pub target_max_norm: f64,

    /// Truncate after this many steps. `0` means no limit.
    #[serde(default)]
    pub max_episode_steps: u32,
}

impl Default for ReacherConfig {
    fn default() -> Self {
        Self {
            action: default_action(),
            frame_skip: default_frame_skip(),
            fingertip_body: default_fingertip_body(),
            fingertip_offset: default_fingertip_offset(),
            termination: DistanceTermination::default(),
            distance_threshold: default_distance_threshold(),
            termination_penalty: default_termination_penalty(),
            reset_noise: default_reset_noise(),
            target_bound: default_target_bound(),
            target_max_norm: default_target_max_norm(),
            max_episode_steps: 0,
        }
    }
}

impl ReacherConfig {
    /// Check every field; called by [`ReacherEnv::new`] and `from_file`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.action.validate()?;
        if self.frame_skip == 0 {
            return Err(invalid("frame_skip", "must be > 0"));
        }
        if !(self.distance_threshold.is_finite() && self.distance_threshold >= 0.0) {
            return Err(invalid("distance_threshold", "must be finite and >= 0"));
        }
        if !self.termination_penalty.is_finite() {
            return Err(invalid("termination_penalty", "must be finite"));
        }
        if !(self.reset_noise.is_finite() && self.reset_noise >= 0.0) {
            return Err(invalid("reset_noise", "must be finite and >= 0"));
        }
        if !(self.target_bound.is_finite() && self.target_bound > 0.0) {
            return Err(invalid("target_bound", "must be finite and > 0"));
        }
        if !(self.target_max_norm.is_finite()
            && self.target_max_norm >= MIN_TARGET_NORM_RATIO * self.target_bound)
        {
            return Err(invalid(
                "target_max_norm",
                "must be finite and at least a tenth of target_bound",
            ));
        }
        Ok(())
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// ReacherEnv
// ---------------------------------------------------------------------------

pub struct ReacherEnv<W: PhysicsWorld> {
    world: W,
    config: ReacherConfig,
    rng: ChaCha8Rng,
    target: Point3<f64>,
    rewards: RewardTable,
    episode: Episode,
    observation_dim: usize,
    last_cause: Option<TerminationCause>,
}

impl<W: PhysicsWorld> ReacherEnv<W> {
    /// Validate `config` against the world and build the environment.
    pub fn new(world: W, config: ReacherConfig) -> Result<Self, DraperyError> {
        config.validate()?;
        let ndofs = world.robot().ndofs();
        if config.action.dim() != ndofs {
            return Err(ConfigError::LengthMismatch {
                what: "action/dof",
                expected: ndofs,
                got: config.action.dim(),
            }
            .into());
        }
        if config.fingertip_body >= world.robot().num_bodies() {
            return Err(invalid("fingertip_body", "no such body").into());
        }

        let max_effort: f64 = config
            .action
            .high
            .iter()
            .zip(&config.action.low)
            .zip(&config.action.scale)
            .map(|((hi, lo), s)| (hi.abs().max(lo.abs()) * s).powi(2))
            .sum();
        let rewards = RewardTable::new()
            .with_term("progress", -1.0, 1.0, 100.0)
            .with_term("control", 0.0, max_effort, -0.001)
            .with_term("alive", 0.0, 1.0, -0.001);

        Ok(Self {
            world,
            rng: ChaCha8Rng::seed_from_u64(0),
            target: Point3::new(0.8, -0.6, 0.6),
            rewards,
            episode: Episode::default(),
            observation_dim: 3 * ndofs + 6,
            last_cause: None,
            config,
        })
    }

    /// The simulated world.
    pub const fn world(&self) -> &W {
        &self.world
    }

    /// Mutable world access, e.g. to inject a state in tests.
    pub const fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Validated configuration.
    pub const fn config(&self) -> &ReacherConfig {
        &self.config
    }

    /// Bookkeeping of the current episode.
    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    /// Per-term values of the last step.
    pub const fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    /// Current target in world coordinates.
    pub const fn target(&self) -> &Point3<f64> {
        &self.target
    }

    /// Why the last episode ended, if it did.
    pub const fn last_termination(&self) -> Option<TerminationCause> {
        self.last_cause
    }

    /// Move the target and its marker.
    pub fn set_target(&mut self, target: Point3<f64>) {
        self.target = target;
        self.world.set_marker(&target);
    }

    /// Fingertip position in world coordinates.
    pub fn fingertip(&self) -> Point3<f64> {
        let offset = Point3::from(Vector3::from(self.config.fingertip_offset));
        self.world.robot().to_world(self.config.fingertip_body, &offset)
    }

    fn observe(&self) -> Result<Observation, ValidationError> {
        let robot = self.world.robot();
        let q = robot.positions();
        let vec = self.fingertip() - self.target;

        let mut obs = Vec::with_capacity(self.observation_dim);
        obs.extend(q.iter().map(|v| v.cos()));
        obs.extend(q.iter().map(|v| v.sin()));
        obs.extend(self.target.iter());
        obs.extend(robot.velocities());
        obs.extend(vec.iter());

        if obs.len() != self.observation_dim {
            return Err(ValidationError::ObservationDimMismatch {
                expected: self.observation_dim,
                got: obs.len(),
            });
        }
        Ok(Observation::from_f64(&obs))
    }

    fn state_is_finite(&self) -> bool {
        let robot = self.world.robot();
        robot
            .positions()
            .iter()
            .chain(robot.velocities().iter())
            .all(|v| v.is_finite())
    }
}

impl<W: PhysicsWorld> Environment for ReacherEnv<W> {
    fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::unbounded(self.observation_dim)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn action_space(&self) -> ActionSpace {
        ActionSpace {
            low: self.config.action.low.iter().map(|v| *v as f32).collect(),
            high: self.config.action.high.iter().map(|v| *v as f32).collect(),
        }
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<ResetResult, DraperyError> {
        if let Some(seed) = seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }
        self.world.reset()?;

        let noise = Uniform::new_inclusive(-self.config.reset_noise, self.config.reset_noise);
        let robot = self.world.robot_mut();
        let q: Vec<f64> = robot
            .positions()
            .iter()
            .map(|v| v + noise.sample(&mut self.rng))
            .collect();
        let dq: Vec<f64> = robot
            .velocities()
            .iter()
            .map(|v| v + noise.sample(&mut self.rng))
            .collect();
        robot.set_positions(&q)?;
        robot.set_velocities(&dq)?;

        let bound = Uniform::new_inclusive(-self.config.target_bound, self.config.target_bound);
        let target = loop {
            let candidate = Point3::new(
                bound.sample(&mut self.rng),
                bound.sample(&mut self.rng),
                bound.sample(&mut self.rng),
            );
            if candidate.coords.norm() < self.config.target_max_norm {
                break candidate;
            }
        };
        self.set_target(target);
        debug!(?target, "reacher target sampled");

        self.rewards.clear_values();
        self.episode.reset(seed);
        self.last_cause = None;

        Ok(ResetResult {
            observation: self.observe()?,
            info: ResetInfo {
                seed,
                reset_state: None,
            },
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn step(&mut self, action: &Action) -> Result<StepResult, DraperyError> {
        action.validate(self.config.action.dim())?;
        let tau = self.config.action.clamp_and_scale(&action.to_f64());

        let tip_before = self.fingertip();
        let to_target = self.target - tip_before;
        for _ in 0..self.config.frame_skip {
            self.world.step(&tau)?;
        }
        let tip_after = self.fingertip();

        let distance = (self.target - tip_after).norm();
        let progress = to_target
            .try_normalize(0.0)
            .map_or(0.0, |dir| (tip_after - tip_before).dot(&dir));
        let effort: f64 = tau.iter().map(|t| t * t).sum();
        self.rewards.update(&[progress, effort, 1.0])?;

        let (reward, cause) = if !self.state_is_finite() {
            warn!(step = self.episode.step_count, "non-finite reacher state");
            (self.config.termination_penalty, Some(TerminationCause::NonFinite))
        } else if self
            .config
            .termination
            .fires(distance, self.config.distance_threshold)
        {
            (self.rewards.total(), Some(TerminationCause::ReachedTarget))
        } else {
            (self.rewards.total(), None)
        };

        let observation = self.observe()?;
        self.episode.advance(reward);
        if cause.is_some() {
            self.episode.terminate();
            self.last_cause = cause;
        }
        let truncated = self.episode.check_truncation(self.config.max_episode_steps);

        let info = StepInfo {
            episode_length: self.episode.step_count,
            episode_reward: self.episode.total_reward as f32,
            termination: cause.map(|c| c.name().to_string()),
            reward_terms: self.rewards.value_map(),
            aux: [tip_after.x, tip_after.y, tip_after.z, reward]
                .iter()
                .map(|v| *v as f32)
                .collect(),
        };

        Ok(StepResult {
            observation,
            reward: reward as f32,
            terminated: cause.is_some(),
            truncated,
            info,
        })
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "Reacher"
    }
}

impl<W: PhysicsWorld> DebugRender for ReacherEnv<W> {
    fn viewer_setup(&self) -> CameraSetup {
        CameraSetup {
            translation: [0.0, 0.0, -3.5],
            theta: 0.0,
            track_skeleton: Some(0),
        }
    }

    fn extra_render(&self) -> Vec<DrawCommand> {
        vec![
            DrawCommand::Sphere {
                center: to_array(&self.target),
                radius: 0.02,
                color: Color::RED,
                solid: true,
            },
            DrawCommand::LineStrip {
                points: vec![to_array(&self.target), to_array(&self.fingertip())],
                color: Color::RED,
            },
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use drapery_physics::kinematic::KinematicWorld;
    use drapery_physics::kinematic::presets::reacher_arm;

    fn env() -> ReacherEnv<KinematicWorld> {
        ReacherEnv::new(KinematicWorld::new(reacher_arm(), 0.01), ReacherConfig::default()).unwrap()
    }

    // ---- config ----

    #[test]
    fn default_config_is_valid() {
        let cfg = ReacherConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.frame_skip, 4);
        assert_eq!(cfg.termination, DistanceTermination::WithinThreshold);
    }

    #[test]
    fn config_rejects_zero_frame_skip() {
        let cfg = ReacherConfig {
            frame_skip: 0,
            ..ReacherConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn config_rejects_unreachable_target_ball() {
        let cfg = ReacherConfig {
            target_max_norm: 1e-6,
            ..ReacherConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "target_max_norm"
        ));

        let cfg = ReacherConfig {
            target_max_norm: 0.1,
            ..ReacherConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_parses_partial_toml() {
        let cfg: ReacherConfig =
            toml::from_str("termination = \"beyond_threshold\"\nframe_skip = 2\n").unwrap();
        assert_eq!(cfg.termination, DistanceTermination::BeyondThreshold);
        assert_eq!(cfg.frame_skip, 2);
        assert_eq!(cfg.action.dim(), 5);
    }

    #[test]
    fn new_rejects_action_dim_mismatch() {
        let cfg = ReacherConfig {
            action: ActionConfig::uniform(3, 1.0, 10.0),
            ..ReacherConfig::default()
        };
        let result = ReacherEnv::new(KinematicWorld::new(reacher_arm(), 0.01), cfg);
        assert!(matches!(
            result,
            Err(DraperyError::Config(ConfigError::LengthMismatch { .. }))
        ));
    }

    // ---- termination rule ----

    #[test]
    fn distance_termination_rules() {
        assert!(DistanceTermination::WithinThreshold.fires(0.05, 0.1));
        assert!(!DistanceTermination::WithinThreshold.fires(0.5, 0.1));
        assert!(DistanceTermination::BeyondThreshold.fires(0.5, 0.1));
        assert!(!DistanceTermination::BeyondThreshold.fires(0.05, 0.1));
    }

    // ---- reset ----

    #[test]
    fn reset_samples_target_inside_ball() {
        let mut env = env();
        for seed in 0..20 {
            env.reset(Some(seed)).unwrap();
            assert!(env.target().coords.norm() < 1.5);
            assert!(env.target().iter().all(|c| c.abs() <= 1.0));
            assert_eq!(env.world().marker(), env.target());
        }
    }

    #[test]
    fn reset_perturbs_state_slightly() {
        let mut env = env();
        env.reset(Some(1)).unwrap();
        let robot = env.world().robot();
        assert!(robot.positions().iter().all(|v| v.abs() <= 0.01));
        assert!(robot.velocities().iter().all(|v| v.abs() <= 0.01));
    }

    #[test]
    fn observation_layout() {
        let mut env = env();
        let obs = env.reset(Some(2)).unwrap().observation;
        assert_eq!(obs.len(), 21);
        let target = env.target();
        #[allow(clippy::cast_possible_truncation)]
        let expected = target.x as f32;
        assert!((obs[10] - expected).abs() < f32::EPSILON);
    }

    // ---- step ----

    #[test]
    fn reward_is_table_total() {
        let mut env = env();
        env.reset(Some(3)).unwrap();
        env.set_target(Point3::new(0.9, 0.5, 0.3));
        let result = env.step(&Action::new(vec![0.5, -0.2, 0.1, 0.0, 1.0])).unwrap();
        #[allow(clippy::cast_possible_truncation)]
        let total = env.rewards().total() as f32;
        assert!((result.reward - total).abs() < 1e-4);
        assert_eq!(result.info.aux.len(), 4);
        assert!((result.info.aux[3] - result.reward).abs() < f32::EPSILON);
    }

    #[test]
    fn control_term_uses_clamped_torque() {
        let mut env = env();
        env.reset(Some(3)).unwrap();
        env.set_target(Point3::new(0.9, 0.5, 0.3));
        env.step(&Action::new(vec![5.0, 0.0, 0.0, 0.0, -5.0])).unwrap();
        let effort = env.rewards().terms()[1].value;
        assert!((effort - 200.0).abs() < 1e-9);
    }

    #[test]
    fn reaching_target_terminates_with_default_rule() {
        let mut env = env();
        env.reset(Some(4)).unwrap();
        env.set_target(env.fingertip());
        let result = env.step(&Action::zeros(5)).unwrap();
        assert!(result.terminated);
        assert_eq!(result.info.termination.as_deref(), Some("reached_target"));
        assert_eq!(env.last_termination(), Some(TerminationCause::ReachedTarget));
    }

    #[test]
    fn non_finite_state_terminates_with_penalty() {
        let mut env = env();
        env.reset(Some(5)).unwrap();
        env.set_target(Point3::new(0.9, 0.5, 0.3));
        env.world_mut()
            .robot_mut()
            .set_velocities(&[f64::NAN, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        let result = env.step(&Action::zeros(5)).unwrap();
        assert!(result.terminated);
        assert!((result.reward + 2500.0).abs() < f32::EPSILON);
    }

    #[test]
    fn step_rejects_wrong_action_length() {
        let mut env = env();
        env.reset(None).unwrap();
        let err = env.step(&Action::zeros(4)).unwrap_err();
        assert!(matches!(
            err,
            DraperyError::Validation(ValidationError::ActionDimMismatch {
                expected: 5,
                got: 4
            })
        ));
    }

    #[test]
    fn render_draws_target() {
        let mut env = env();
        env.reset(Some(6)).unwrap();
        let cmds = env.extra_render();
        assert_eq!(cmds[0].kind(), "sphere");
        assert_eq!(env.viewer_setup().track_skeleton, Some(0));
    }
}
