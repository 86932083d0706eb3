//! Validated configuration of the dressing task.
//!
//! Every switch of the task lives here as a typed option. Reward terms are
//! enabled by their presence in [`RewardConfig::weights`]; the right and left
//! target observation blocks follow the corresponding reward terms.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use drapery_core::config::{ActionConfig, load_toml};
use drapery_core::error::ConfigError;

use super::layout::REST_POSE;

// ---------------------------------------------------------------------------
// RewardTermKind
// ---------------------------------------------------------------------------

/// Reward terms of the dressing task, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardTermKind {
    Upright,
    StableHead,
    Deformation,
    RestPose,
    RestComs,
    LeftTarget,
    RightTarget,
    RightTargetAltitude,
    ElbowElevation,
    Alive,
    BicepIn,
}

impl RewardTermKind {
    pub const ALL: [Self; 11] = [
        Self::Upright,
        Self::StableHead,
        Self::Deformation,
        Self::RestPose,
        Self::RestComs,
        Self::LeftTarget,
        Self::RightTarget,
        Self::RightTargetAltitude,
        Self::ElbowElevation,
        Self::Alive,
        Self::BicepIn,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Upright => "upright",
            Self::StableHead => "stable_head",
            Self::Deformation => "deformation",
            Self::RestPose => "rest_pose",
            Self::RestComs => "rest_coms",
            Self::LeftTarget => "left_target",
            Self::RightTarget => "right_target",
            Self::RightTargetAltitude => "right_target_altitude",
            Self::ElbowElevation => "elbow_elevation",
            Self::Alive => "alive",
            Self::BicepIn => "bicep_in",
        }
    }

    /// Display range `(min, max)` of the term's value.
    #[must_use]
    pub const fn display_range(self, task_bonus: bool) -> (f64, f64) {
        match self {
            Self::Upright => (-2.5, 0.0),
            Self::StableHead => (-1.2, 0.0),
            Self::Deformation | Self::LeftTarget | Self::ElbowElevation => (-1.0, 0.0),
            Self::RestPose => (-51.0, 0.0),
            Self::RestComs => (-20.0, 0.0),
            Self::RightTarget if task_bonus => (-2.0, 0.05),
            Self::RightTarget | Self::RightTargetAltitude => (-2.0, 0.0),
            Self::Alive => (0.0, 1.0),
            Self::BicepIn => (-1.0, 1.0),
        }
    }

    /// Weight used when the term is switched on without an explicit weight.
    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::Upright | Self::StableHead | Self::RestPose => 2.0,
            Self::Deformation => 15.0,
            Self::RestComs | Self::ElbowElevation => 10.0,
            Self::LeftTarget => 50.0,
            Self::RightTarget => 100.0,
            Self::RightTargetAltitude => 4.0,
            Self::Alive => 80.0,
            Self::BicepIn => 30.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_action() -> ActionConfig {
    ActionConfig::uniform(REST_POSE.len(), 1.0, 12.0)
}
const fn default_frame_skip() -> u32 {
    4
}
const fn default_true() -> bool {
    true
}
fn default_rest_pose() -> Vec<f64> {
    REST_POSE.to_vec()
}
const fn default_fingertip() -> [f64; 3] {
    [0.0, -0.09, 0.0]
}
fn default_weights() -> BTreeMap<RewardTermKind, f64> {
    [
        RewardTermKind::Upright,
        RewardTermKind::StableHead,
        RewardTermKind::Deformation,
        RewardTermKind::RestPose,
        RewardTermKind::RightTarget,
        RewardTermKind::Alive,
    ]
    .into_iter()
    .map(|k| (k, k.default_weight()))
    .collect()
}
const fn default_position_limit() -> f64 {
    10.0
}
const fn default_elbow_threshold() -> f64 {
    0.1
}
const fn default_penalty() -> f64 {
    -2500.0
}
const fn default_velocity_noise() -> f64 {
    0.2
}
fn default_save_prefix() -> String {
    "matchgrip_reduced".into()
}
const fn default_save_step() -> u32 {
    60
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Optional observation blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationConfig {
    /// Append the previous scaled action.
    #[serde(default)]
    pub prev_action: bool,
    /// Append 3 haptic force values per sensor.
    #[serde(default = "default_true")]
    pub haptics: bool,
    /// Append one contact id per sensor.
    #[serde(default = "default_true")]
    pub contact_ids: bool,
    /// When false, haptic forces read as zeros.
    #[serde(default = "default_true")]
    pub haptics_aware: bool,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            prev_action: false,
            haptics: true,
            contact_ids: true,
            haptics_aware: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Enabled terms and their weights.
    #[serde(default = "default_weights")]
    pub weights: BTreeMap<RewardTermKind, f64>,
    /// Add 0.05 to the right target term within 0.02 of the target.
    #[serde(default = "default_true")]
    pub task_bonus: bool,
    /// Replace target distances with flat penalties outside 0.1.
    #[serde(default)]
    pub target_tiering: bool,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            task_bonus: true,
            target_tiering: false,
        }
    }
}

impl RewardConfig {
    pub fn enabled(&self, kind: RewardTermKind) -> bool {
        self.weights.contains_key(&kind)
    }

    /// Switch a term on with its default weight.
    #[must_use]
    pub fn with_term(mut self, kind: RewardTermKind) -> Self {
        self.weights.insert(kind, kind.default_weight());
        self
    }

    #[must_use]
    pub fn without_term(mut self, kind: RewardTermKind) -> Self {
        self.weights.remove(&kind);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerminationConfig {
    /// End the episode when the collar leaves the head and neck.
    #[serde(default = "default_true")]
    pub collar: bool,
    /// Steps during which the collar is not checked.
    #[serde(default)]
    pub collar_cooldown: u32,
    #[serde(default)]
    pub elbow_elevation: bool,
    #[serde(default = "default_elbow_threshold")]
    pub elbow_threshold: f64,
    /// Largest joint position magnitude before the state counts as unstable.
    #[serde(default = "default_position_limit")]
    pub position_limit: f64,
    #[serde(default = "default_penalty")]
    pub penalty: f64,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            collar: true,
            collar_cooldown: 0,
            elbow_elevation: false,
            elbow_threshold: default_elbow_threshold(),
            position_limit: default_position_limit(),
            penalty: default_penalty(),
        }
    }
}

/// Where the initial character and cloth state come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ResetConfig {
    /// Sample one of the first `size` entries of a recorded manifest.
    Distribution {
        manifest: PathBuf,
        size: usize,
        #[serde(default = "default_velocity_noise")]
        velocity_noise: f64,
    },
    /// Always start from the same character state, or the rest pose if none.
    Fixed {
        #[serde(default)]
        character_state: Option<PathBuf>,
    },
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self::Fixed {
            character_state: None,
        }
    }
}

/// Persist one cloth and character state per episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveConfig {
    /// Manifest the saved states are appended to. Created when missing.
    pub manifest: PathBuf,
    #[serde(default = "default_save_prefix")]
    pub prefix: String,
    /// Step count at which the state is written.
    #[serde(default = "default_save_step")]
    pub at_step: u32,
}

impl SaveConfig {
    #[must_use]
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
            prefix: default_save_prefix(),
            at_step: default_save_step(),
        }
    }
}

// ---------------------------------------------------------------------------
// DressingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DressingConfig {
    #[serde(default = "default_action")]
    pub action: ActionConfig,

    #[serde(default = "default_frame_skip")]
    pub frame_skip: u32,

    /// Run cloth-dependent terms and the handle node.
    #[serde(default = "default_true")]
    pub simulate_cloth: bool,

    #[serde(default = "default_rest_pose")]
    pub rest_pose: Vec<f64>,

    /// Fingertip offset in each hand's frame.
    #[serde(default = "default_fingertip")]
    pub fingertip: [f64; 3],

    #[serde(default)]
    pub observation: ObservationConfig,

    #[serde(default)]
    pub reward: RewardConfig,

    #[serde(default)]
    pub termination: TerminationConfig,

    #[serde(default)]
    pub reset: ResetConfig,

    #[serde(default)]
    pub save: Option<SaveConfig>,

    /// Truncate after this many steps. `0` means no limit.
    #[serde(default)]
    pub max_episode_steps: u32,
}

impl Default for DressingConfig {
    fn default() -> Self {
        Self {
            action: default_action(),
            frame_skip: default_frame_skip(),
            simulate_cloth: true,
            rest_pose: default_rest_pose(),
            fingertip: default_fingertip(),
            observation: ObservationConfig::default(),
            reward: RewardConfig::default(),
            termination: TerminationConfig::default(),
            reset: ResetConfig::default(),
            save: None,
            max_episode_steps: 0,
        }
    }
}

impl DressingConfig {
    /// Check internal consistency. Does not touch the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.action.validate()?;
        if self.frame_skip == 0 {
            return Err(invalid("frame_skip", "must be > 0"));
        }
        if self.rest_pose.len() != self.action.dim() {
            return Err(ConfigError::LengthMismatch {
                what: "rest pose/action",
                expected: self.action.dim(),
                got: self.rest_pose.len(),
            });
        }
        if self.rest_pose.iter().any(|v| !v.is_finite()) {
            return Err(invalid("rest_pose", "must be finite"));
        }

        if let Some((kind, weight)) = self.reward.weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(invalid(
                &format!("reward.weights.{}", kind.label()),
                &format!("{weight} is not finite"),
            ));
        }
        if self.reward.task_bonus && !self.reward.enabled(RewardTermKind::RightTarget) {
            return Err(ConfigError::Incompatible(
                "task bonus without right target term".into(),
            ));
        }
        if self.reward.target_tiering
            && !(self.reward.enabled(RewardTermKind::RightTarget)
                || self.reward.enabled(RewardTermKind::LeftTarget))
        {
            return Err(ConfigError::Incompatible(
                "target tiering without a target term".into(),
            ));
        }

        let term = &self.termination;
        if !(term.position_limit.is_finite() && term.position_limit > 0.0) {
            return Err(invalid("termination.position_limit", "must be finite and > 0"));
        }
        if !term.elbow_threshold.is_finite() {
            return Err(invalid("termination.elbow_threshold", "must be finite"));
        }
        if !term.penalty.is_finite() {
            return Err(invalid("termination.penalty", "must be finite"));
        }

        if let ResetConfig::Distribution {
            size,
            velocity_noise,
            ..
        } = &self.reset
        {
            if *size == 0 {
                return Err(invalid("reset.size", "must be > 0"));
            }
            if !(velocity_noise.is_finite() && *velocity_noise >= 0.0) {
                return Err(invalid("reset.velocity_noise", "must be finite and >= 0"));
            }
        }
        if let Some(save) = &self.save {
            if save.prefix.is_empty() {
                return Err(invalid("save.prefix", "must not be empty"));
            }
            if !self.simulate_cloth {
                return Err(ConfigError::Incompatible(
                    "state saving requires cloth simulation".into(),
                ));
            }
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
// Tests
// ---------------------------------------------------------------------------
