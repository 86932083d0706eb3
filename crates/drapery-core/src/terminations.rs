//! Episode termination causes and the shared numeric-stability check.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TerminationCause
// ---------------------------------------------------------------------------

/// Why an episode ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    /// A joint position left the stable range.
    Instability,
    /// The state contains NaN or infinity.
    NonFinite,
    /// The garment collar slipped off the head.
    CollarOff,
    /// The elbow rose too far above the shoulders.
    ElbowElevation,
    /// The distance criterion of the reaching task fired.
    ReachedTarget,
}

impl TerminationCause {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Instability => "instability",
            Self::NonFinite => "non_finite",
            Self::CollarOff => "collar_off",
            Self::ElbowElevation => "elbow_elevation",
            Self::ReachedTarget => "reached_target",
        }
    }

    /// Whether the cause signals a failed simulation rather than task logic.
    #[must_use]
    pub const fn is_numeric_failure(self) -> bool {
        matches!(self, Self::Instability | Self::NonFinite)
    }
}

impl fmt::Display for TerminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// StabilityCheck
// ---------------------------------------------------------------------------

/// Detects a blown-up simulation from joint positions and velocities.
///
/// Positions are tested against `position_limit` first; a NaN position never
/// exceeds the limit and is reported as [`TerminationCause::NonFinite`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityCheck {
    pub position_limit: f64,
}

impl StabilityCheck {
    #[must_use]
    pub const fn new(position_limit: f64) -> Self {
        Self { position_limit }
    }

    #[must_use]
    pub fn check(&self, q: &[f64], dq: &[f64]) -> Option<TerminationCause> {
        if q.iter().any(|v| v.abs() > self.position_limit) {
            return Some(TerminationCause::Instability);
        }
        if !q.iter().chain(dq).all(|v| v.is_finite()) {
            return Some(TerminationCause::NonFinite);
        }
        None
    }
}

impl Default for StabilityCheck {
    fn default() -> Self {
        Self::new(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_state_passes() {
        let check = StabilityCheck::default();
        assert_eq!(check.check(&[0.1, -9.9], &[100.0, -3.0]), None);
    }

    #[test]
    fn large_position_is_instability() {
        let check = StabilityCheck::default();
        assert_eq!(
            check.check(&[0.0, 10.5], &[0.0, 0.0]),
            Some(TerminationCause::Instability)
        );
    }

    #[test]
    fn infinite_position_is_instability() {
        let check = StabilityCheck::default();
        assert_eq!(
            check.check(&[f64::INFINITY], &[0.0]),
            Some(TerminationCause::Instability)
        );
    }

    #[test]
    fn nan_anywhere_is_non_finite() {
        let check = StabilityCheck::default();
        assert_eq!(
            check.check(&[f64::NAN], &[0.0]),
            Some(TerminationCause::NonFinite)
        );
        assert_eq!(
            check.check(&[0.0], &[f64::NEG_INFINITY]),
            Some(TerminationCause::NonFinite)
        );
    }

    #[test]
    fn cause_names() {
        assert_eq!(TerminationCause::CollarOff.to_string(), "collar_off");
        assert!(TerminationCause::NonFinite.is_numeric_failure());
        assert!(!TerminationCause::ReachedTarget.is_numeric_failure());
    }
}
