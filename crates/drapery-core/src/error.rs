use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for drapery.
#[derive(Debug, Error)]
pub enum DraperyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

/// Configuration errors. Raised once, when an environment is constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),

    #[error("Mismatched {what} lengths: expected {expected}, got {got}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Simulation runtime errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Reset failed: {0}")]
    ResetFailed(String),

    #[error("Step failed: {0}")]
    StepFailed(String),

    #[error("State file {path}: {source}")]
    StateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed state file {path}: {message}")]
    MalformedState { path: PathBuf, message: String },

    #[error("Reset state {index} is not registered ({available} available)")]
    UnknownResetState { index: usize, available: usize },
}

impl SimError {
    /// Wrap an IO error with the offending path.
    pub fn state_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StateFile {
            path: path.into(),
            source,
        }
    }

    /// Report a parse failure in a state file.
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedState {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Reset-state manifest errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    Write(#[from] toml::ser::Error),

    #[error("Duplicate manifest index {0}")]
    DuplicateIndex(u32),

    #[error("Manifest holds {available} entries, {requested} requested")]
    TooFewEntries { available: usize, requested: usize },
}

/// Action/observation validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    ActionDimMismatch { expected: usize, got: usize },

    #[error("Action contains NaN")]
    ActionContainsNan,

    #[error("Action contains Inf")]
    ActionContainsInf,

    #[error("Observation dimension mismatch: expected {expected}, got {got}")]
    ObservationDimMismatch { expected: usize, got: usize },

    #[error("Reward table expects {expected} values, got {got}")]
    RewardTermMismatch { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drapery_error_from_config_error() {
        let err = ConfigError::Incompatible("task bonus without right target".into());
        let top: DraperyError = err.into();
        assert!(matches!(top, DraperyError::Config(_)));
        assert!(top.to_string().contains("task bonus"));
    }

    #[test]
    fn drapery_error_from_sim_error() {
        let top: DraperyError = SimError::ResetFailed("no character".into()).into();
        assert!(matches!(top, DraperyError::Simulation(_)));
    }

    #[test]
    fn drapery_error_from_validation_error() {
        let top: DraperyError = ValidationError::ActionContainsNan.into();
        assert!(matches!(top, DraperyError::Validation(_)));
    }

    #[test]
    fn drapery_error_from_manifest_error() {
        let top: DraperyError = ManifestError::DuplicateIndex(3).into();
        assert!(matches!(top, DraperyError::Manifest(_)));
        assert!(top.to_string().contains('3'));
    }

    #[test]
    fn validation_error_is_copy() {
        let err = ValidationError::ActionContainsInf;
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn validation_error_display_messages() {
        assert_eq!(
            ValidationError::ActionDimMismatch {
                expected: 22,
                got: 5
            }
            .to_string(),
            "Action dimension mismatch: expected 22, got 5"
        );
        assert_eq!(
            ValidationError::ObservationDimMismatch {
                expected: 163,
                got: 160
            }
            .to_string(),
            "Observation dimension mismatch: expected 163, got 160"
        );
        assert_eq!(
            ValidationError::RewardTermMismatch {
                expected: 6,
                got: 5
            }
            .to_string(),
            "Reward table expects 6 values, got 5"
        );
    }

    #[test]
    fn config_error_display_messages() {
        assert_eq!(
            ConfigError::InvalidValue {
                field: "frame_skip".into(),
                message: "must be > 0".into()
            }
            .to_string(),
            "Invalid value for frame_skip: must be > 0"
        );
        assert_eq!(
            ConfigError::LengthMismatch {
                what: "action scale",
                expected: 5,
                got: 3
            }
            .to_string(),
            "Mismatched action scale lengths: expected 5, got 3"
        );
    }

    #[test]
    fn sim_error_display_messages() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SimError::state_file("states/a_char00000", io);
        assert!(err.to_string().starts_with("State file states/a_char00000"));
        assert_eq!(
            SimError::UnknownResetState {
                index: 4,
                available: 2
            }
            .to_string(),
            "Reset state 4 is not registered (2 available)"
        );
        assert_eq!(
            SimError::malformed("mesh.obj", "bad vertex").to_string(),
            "Malformed state file mesh.obj: bad vertex"
        );
    }
}
