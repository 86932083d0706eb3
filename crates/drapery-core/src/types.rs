use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f32 vector representing environment state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f32>,
}

impl Observation {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    /// Narrow an `f64` engine-side vector into an observation.
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f64(values: &[f64]) -> Self {
        Self {
            data: values.iter().map(|v| *v as f32).collect(),
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Whether every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        &self.data[i]
    }
}

impl From<Vec<f32>> for Observation {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Continuous control command sent to an environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f32>,
}

impl Action {
    pub const fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Action filled with zeros.
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Widen to the engine's `f64` representation.
    pub fn to_f64(&self) -> Vec<f64> {
        self.data.iter().map(|v| f64::from(*v)).collect()
    }

    /// Validate the action against an expected dimension (no NaN, no Inf).
    pub fn validate(&self, expected_dim: usize) -> Result<(), ValidationError> {
        if self.data.len() != expected_dim {
            return Err(ValidationError::ActionDimMismatch {
                expected: expected_dim,
                got: self.data.len(),
            });
        }
        for val in &self.data {
            if val.is_nan() {
                return Err(ValidationError::ActionContainsNan);
            }
            if val.is_infinite() {
                return Err(ValidationError::ActionContainsInf);
            }
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Action {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Spaces
// ---------------------------------------------------------------------------

/// Shape and bounds of valid observations (Gymnasium `Box`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl ObservationSpace {
    /// Unbounded box of the given dimension.
    pub fn unbounded(dim: usize) -> Self {
        Self {
            low: vec![f32::NEG_INFINITY; dim],
            high: vec![f32::INFINITY; dim],
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn size(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, obs: &Observation) -> bool {
        obs.len() == self.low.len()
            && obs
                .as_slice()
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }
}

/// Shape and bounds of valid actions (Gymnasium `Box`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl ActionSpace {
    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn size(&self) -> usize {
        self.low.len()
    }

    /// Sample a random action. Takes `&mut impl Rng` for determinism.
    pub fn sample(&self, rng: &mut impl rand::Rng) -> Action {
        let data = self
            .low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| rng.gen_range(*l..=*h))
            .collect();
        Action::new(data)
    }

    pub fn contains(&self, action: &Action) -> bool {
        action.len() == self.low.len()
            && action
                .as_slice()
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }
}

// ---------------------------------------------------------------------------
// StepResult / ResetResult
// ---------------------------------------------------------------------------

/// Result of `env.step(action)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f32,
    /// Episode ended due to task success/failure.
    pub terminated: bool,
    /// Episode ended due to time limit.
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepResult {
    pub const fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    pub episode_length: u32,
    pub episode_reward: f32,
    /// Why the episode terminated, when it did.
    pub termination: Option<String>,
    /// Per-term reward values as displayed in the reward table.
    pub reward_terms: BTreeMap<String, f32>,
    /// Auxiliary prediction signal (environment-specific layout).
    pub aux: Vec<f32>,
}

/// Result of `env.reset()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResult {
    pub observation: Observation,
    pub info: ResetInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetInfo {
    pub seed: Option<u64>,
    /// Index of the reset state drawn from the distribution, if any.
    pub reset_state: Option<usize>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
