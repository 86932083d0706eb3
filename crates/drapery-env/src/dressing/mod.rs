//! Upper-body dressing task.
//!
//! The left hand holds the garment through a [`HandleNode`] pinned to the left
//! grip patch; the right hand is rewarded for reaching a target derived from
//! the right grip patch while the collar stays around the neck. Episodes start
//! from the rest pose or from a recorded state distribution.

pub mod config;
pub mod layout;
pub mod observation;
pub mod pose;
mod render;
pub mod reset;
pub mod reward;
pub mod termination;

use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use drapery_core::error::{ConfigError, DraperyError};
use drapery_core::manifest::ManifestEntry;
use drapery_core::terminations::TerminationCause;
use drapery_core::traits::Environment;
use drapery_core::types::{
    Action, ActionSpace, Observation, ObservationSpace, ResetInfo, ResetResult, StepInfo,
    StepResult,
};
use drapery_physics::backend::{PhysicsWorld, Skeleton};
use drapery_physics::cloth::{ClothScene, ClothWorld, vertex_average_normal, vertex_centroid};
use drapery_physics::feature::ClothFeature;
use drapery_physics::handle::HandleNode;

use crate::episode::Episode;

pub use config::{
    DressingConfig, ObservationConfig, ResetConfig, RewardConfig, RewardTermKind, SaveConfig,
    TerminationConfig,
};
use layout::{
    COLLAR, GRIP_LEFT, GRIP_LEFT_SPANS, GRIP_RIGHT, GRIP_RIGHT_SPANS, HANDLE_ORIGIN, LEFT_HAND,
    RIGHT_HAND, TARGET_NORMAL_OFFSET,
};
use observation::ObservationLayout;
use reset::{ResetSource, StateSaver};
use reward::{DressingRewards, RewardInputs};
use termination::DressingTermination;

pub struct DressingEnv<W: ClothWorld> {
    world: W,
    config: DressingConfig,
    rng: ChaCha8Rng,
    layout: ObservationLayout,
    rewards: DressingRewards,
    termination: DressingTermination,
    reset_source: ResetSource,
    saver: Option<StateSaver>,

    collar: ClothFeature,
    grip_left: ClothFeature,
    grip_right: ClothFeature,
    handle: Option<HandleNode>,

    rest_coms: Vec<Point3<f64>>,
    rest_links: Vec<[Point3<f64>; 2]>,
    left_target: Point3<f64>,
    right_target: Point3<f64>,
    prev_tau: Vec<f64>,

    episode: Episode,
    last_reward: f64,
    last_cause: Option<TerminationCause>,
    last_saved: Option<ManifestEntry>,
}

impl<W: ClothWorld> DressingEnv<W> {
    /// Validate `config` against the world, load the reset distribution and
    /// open the save manifest.
    pub fn new(world: W, config: DressingConfig) -> Result<Self, DraperyError> {
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
        if world.robot().num_bodies() <= layout::HEAD {
            return Err(ConfigError::InvalidValue {
                field: "skeleton".into(),
                message: format!(
                    "{} bodies, the upper body needs {}",
                    world.robot().num_bodies(),
                    layout::HEAD + 1
                ),
            }
            .into());
        }
        if ndofs < layout::required_dofs() {
            return Err(ConfigError::InvalidValue {
                field: "skeleton".into(),
                message: format!(
                    "{ndofs} dofs, the upper body needs {}",
                    layout::required_dofs()
                ),
            }
            .into());
        }
        let required = layout::required_vertices();
        if world.cloth().num_vertices() < required {
            return Err(ConfigError::InvalidValue {
                field: "garment".into(),
                message: format!(
                    "{} vertices, the garment features need {required}",
                    world.cloth().num_vertices()
                ),
            }
            .into());
        }

        let reset_source = ResetSource::from_config(&config.reset)?;
        let saver = config.save.as_ref().map(StateSaver::open).transpose()?;
        let layout = ObservationLayout::new(&config, ndofs, world.cloth().num_haptic_sensors());
        let handle = config
            .simulate_cloth
            .then(|| HandleNode::new(Point3::from(Vector3::from(HANDLE_ORIGIN))));

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(0),
            layout,
            rewards: DressingRewards::new(&config.reward),
            termination: DressingTermination::new(config.termination),
            reset_source,
            saver,
            collar: ClothFeature::new(COLLAR.to_vec()),
            grip_left: ClothFeature::new(GRIP_LEFT.to_vec())
                .with_basis_spans(GRIP_LEFT_SPANS.0, GRIP_LEFT_SPANS.1),
            grip_right: ClothFeature::new(GRIP_RIGHT.to_vec())
                .with_basis_spans(GRIP_RIGHT_SPANS.0, GRIP_RIGHT_SPANS.1),
            handle,
            rest_coms: Vec::new(),
            rest_links: Vec::new(),
            left_target: Point3::origin(),
            right_target: Point3::origin(),
            prev_tau: vec![0.0; ndofs],
            episode: Episode::default(),
            last_reward: 0.0,
            last_cause: None,
            last_saved: None,
            world,
            config,
        })
    }

    pub const fn world(&self) -> &W {
        &self.world
    }

    pub const fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub const fn config(&self) -> &DressingConfig {
        &self.config
    }

    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    pub const fn rewards(&self) -> &DressingRewards {
        &self.rewards
    }

    /// Block layout of the observation vector.
    pub const fn layout(&self) -> &ObservationLayout {
        &self.layout
    }

    pub const fn collar(&self) -> &ClothFeature {
        &self.collar
    }

    /// Handle node pinning the left grip; `None` without cloth simulation.
    pub const fn handle(&self) -> Option<&HandleNode> {
        self.handle.as_ref()
    }

    /// Left fingertip at the rest pose.
    pub const fn left_target(&self) -> &Point3<f64> {
        &self.left_target
    }

    /// Right grip centroid pushed out along its average normal.
    pub const fn right_target(&self) -> &Point3<f64> {
        &self.right_target
    }

    /// Why the last episode ended, if it did.
    pub const fn last_termination(&self) -> Option<TerminationCause> {
        self.last_cause
    }

    /// Entry written by the most recent state save.
    pub const fn last_saved(&self) -> Option<&ManifestEntry> {
        self.last_saved.as_ref()
    }

    /// Fingertip of `hand` in world coordinates.
    pub fn fingertip(&self, hand: usize) -> Point3<f64> {
        pose::body_point(self.world.robot(), hand, self.config.fingertip)
    }

    fn update_right_target(&mut self) {
        let cloth = self.world.cloth();
        self.right_target = vertex_centroid(cloth, &GRIP_RIGHT)
            + vertex_average_normal(cloth, &GRIP_RIGHT) * TARGET_NORMAL_OFFSET;
    }

    /// Refresh cloth-derived targets and drive the handle from the left hand.
    fn update_before_simulation(&mut self) {
        self.update_right_target();
        self.collar.fit_plane(self.world.cloth(), None);
        self.grip_left.fit_plane(self.world.cloth(), None);
        self.grip_right.fit_plane(self.world.cloth(), None);

        if let Some(handle) = &mut self.handle {
            handle.set_transform(&self.world.robot().body_transform(LEFT_HAND));
            handle.step(self.world.cloth_mut());
        }
    }

    fn compute_reward(&mut self) -> Result<f64, DraperyError> {
        let robot = self.world.robot();
        let q = robot.positions();
        let coms = pose::body_coms(robot);
        let deformation = if self.config.simulate_cloth {
            self.world.cloth().max_deformation_ratio()
        } else {
            0.0
        };
        let inputs = RewardInputs {
            q: &q,
            rest_pose: &self.config.rest_pose,
            coms: &coms,
            rest_coms: &self.rest_coms,
            deformation,
            left_target: self.left_target,
            left_fingertip: self.fingertip(LEFT_HAND),
            right_target: self.right_target,
            right_fingertip: self.fingertip(RIGHT_HAND),
            elbow_elevation: pose::elbow_elevation(robot),
            bicep_alignment: pose::bicep_alignment(robot),
        };
        Ok(self.rewards.evaluate(&inputs)?)
    }

    fn observe(&self) -> Result<Observation, DraperyError> {
        let robot = self.world.robot();
        let cloth = self.world.cloth();
        let q = robot.positions();

        let mut obs = Vec::with_capacity(self.layout.size());
        obs.extend(q.iter().map(|v| v.cos()));
        obs.extend(q.iter().map(|v| v.sin()));
        obs.extend(robot.velocities());
        if self.layout.prev_action {
            obs.extend(&self.prev_tau);
        }
        if self.layout.haptics {
            if self.config.simulate_cloth && self.config.observation.haptics_aware {
                obs.extend(cloth.haptic_sensor_obs());
            } else {
                obs.extend(std::iter::repeat_n(0.0, 3 * self.layout.sensors));
            }
        }
        if self.layout.contact_ids {
            obs.extend(cloth.haptic_contact_ids());
        }
        for (enabled, target, hand) in [
            (self.layout.right_target, self.right_target, RIGHT_HAND),
            (self.layout.left_target, self.left_target, LEFT_HAND),
        ] {
            if enabled {
                let tip = self.fingertip(hand);
                obs.extend(target.iter());
                obs.extend(tip.iter());
                obs.extend((target - tip).iter());
            }
        }
        Ok(self.layout.finish(&obs)?)
    }

    /// Run the termination checks in order, saving the state in between when
    /// due.
    fn check_termination(
        &mut self,
        steps_taken: u32,
    ) -> Result<Option<TerminationCause>, DraperyError> {
        let robot = self.world.robot();
        let (q, dq) = (robot.positions(), robot.velocities());
        if let Some(cause) = self.termination.numeric(&q, &dq) {
            warn!(%cause, step = steps_taken, "dressing state blew up");
            return Ok(Some(cause));
        }

        let head = pose::head_chain(robot);
        let simulate_cloth = self.config.simulate_cloth;
        if let Some(cause) = self
            .termination
            .collar(simulate_cloth, steps_taken, &self.collar, &head)
        {
            return Ok(Some(cause));
        }

        if let Some(saver) = &mut self.saver {
            if steps_taken == saver.at_step() && self.episode.previous_resets() > 0 {
                self.last_saved = Some(saver.save(&self.world)?);
            }
        }

        Ok(self.termination.elbow(pose::elbow_elevation(self.world.robot())))
    }
}

impl<W: ClothWorld> Environment for DressingEnv<W> {
    fn observation_space(&self) -> ObservationSpace {
        ObservationSpace::unbounded(self.layout.size())
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

        self.world.robot_mut().set_positions(&self.config.rest_pose)?;
        self.left_target = self.fingertip(LEFT_HAND);
        self.rest_coms = pose::body_coms(self.world.robot());
        self.rest_links = pose::links(self.world.robot());

        let reset_state = self.reset_source.apply(&mut self.world, &mut self.rng)?;

        if let Some(handle) = &mut self.handle {
            let cloth = self.world.cloth_mut();
            handle.clear(cloth);
            handle.add_vertices(cloth, &GRIP_LEFT);
            handle.set_origin_to_centroid(cloth);
            handle.set_transform(&self.world.robot().body_transform(LEFT_HAND));
            handle.recompute_offsets(self.world.cloth());
        }

        self.update_right_target();
        if self.config.simulate_cloth {
            let up = Some(Vector3::z());
            self.collar.fit_plane(self.world.cloth(), None);
            self.grip_left.fit_plane(self.world.cloth(), up);
            self.grip_right.fit_plane(self.world.cloth(), up);
        }

        self.prev_tau.fill(0.0);
        self.rewards.clear();
        self.episode.reset(seed);
        self.last_reward = 0.0;
        self.last_cause = None;

        Ok(ResetResult {
            observation: self.observe()?,
            info: ResetInfo { seed, reset_state },
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn step(&mut self, action: &Action) -> Result<StepResult, DraperyError> {
        action.validate(self.config.action.dim())?;
        let tau = self.config.action.clamp_and_scale(&action.to_f64());

        self.update_before_simulation();
        for _ in 0..self.config.frame_skip {
            self.world.step(&tau)?;
        }

        let shaped = self.compute_reward()?;
        self.prev_tau = tau;
        let observation = self.observe()?;

        let steps_taken = self.episode.step_count;
        let cause = self.check_termination(steps_taken)?;
        let reward = if cause.is_some() {
            self.termination.penalty()
        } else {
            shaped
        };
        self.last_reward = reward;

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
            reward_terms: self.rewards.table().value_map(),
            aux: Vec::new(),
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
        "UpperBodyDressing"
    }
}
