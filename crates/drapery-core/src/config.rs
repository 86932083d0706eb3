use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Read and parse a TOML file into any deserializable config type.
pub fn load_toml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

// ---------------------------------------------------------------------------
// ActionConfig
// ---------------------------------------------------------------------------

/// Per-dimension control bounds and scale.
///
/// Raw actions are clamped into `[low_i, high_i]` and then multiplied by
/// `scale_i` to become joint torques.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ActionConfig {
    /// Symmetric bounds `±bound` with one scale for every dimension.
    #[must_use]
    pub fn uniform(dim: usize, bound: f64, scale: f64) -> Self {
        Self {
            high: vec![bound; dim],
            low: vec![-bound; dim],
            scale: vec![scale; dim],
        }
    }

    /// Build from the recorded two-row layout: row 0 is high, row 1 is low.
    #[must_use]
    pub fn from_bounds_rows(bounds: [Vec<f64>; 2], scale: Vec<f64>) -> Self {
        let [high, low] = bounds;
        Self { high, low, scale }
    }

    pub fn dim(&self) -> usize {
        self.high.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.high.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "action".into(),
                message: "at least one dimension is required".into(),
            });
        }
        for (what, len) in [("action low", self.low.len()), ("action scale", self.scale.len())] {
            if len != self.high.len() {
                return Err(ConfigError::LengthMismatch {
                    what,
                    expected: self.high.len(),
                    got: len,
                });
            }
        }
        for (i, (lo, hi)) in self.low.iter().zip(&self.high).enumerate() {
            if !(lo.is_finite() && hi.is_finite()) || lo > hi {
                return Err(ConfigError::InvalidValue {
                    field: format!("action bounds[{i}]"),
                    message: format!("low {lo} must be finite and <= high {hi}"),
                });
            }
        }
        if let Some(s) = self.scale.iter().find(|s| !s.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "action scale".into(),
                message: format!("{s} is not finite"),
            });
        }
        Ok(())
    }

    /// Clamp each component into its bounds.
    pub fn clamp(&self, action: &[f64]) -> Vec<f64> {
        action
            .iter()
            .zip(self.low.iter().zip(&self.high))
            .map(|(a, (lo, hi))| a.clamp(*lo, *hi))
            .collect()
    }

    /// Clamp, then scale into torques.
    pub fn clamp_and_scale(&self, action: &[f64]) -> Vec<f64> {
        self.clamp(action)
            .into_iter()
            .zip(&self.scale)
            .map(|(a, s)| a * s)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
