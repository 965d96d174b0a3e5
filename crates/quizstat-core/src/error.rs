//! Configuration error types.
//!
//! Insufficient data is not an error in quizstat: the statistics engine
//! reports it as an absent metric. These errors cover configuration that
//! would make every evaluation meaningless.

use thiserror::Error;

/// Errors raised while loading or validating an analysis configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A proportion threshold lies outside [0, 1].
    #[error("{name} must be between 0 and 1, got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    /// Two thresholds that must be ordered are not.
    #[error("{upper} ({upper_value}) must be greater than {lower} ({lower_value})")]
    Inverted {
        upper: &'static str,
        upper_value: f64,
        lower: &'static str,
        lower_value: f64,
    },

    /// A discrimination or correlation threshold lies outside [-1, 1].
    #[error("{name} must be between -1 and 1, got {value}")]
    OutOfCorrelationRange { name: &'static str, value: f64 },

    /// The grouping method name is not recognized.
    #[error("unknown grouping method: {0} (expected top_bottom_27, thirds or median)")]
    UnknownGroupingMethod(String),
}

impl ConfigError {
    /// The configuration key the error refers to.
    pub fn key(&self) -> &str {
        match self {
            ConfigError::OutOfRange { name, .. } => name,
            ConfigError::Inverted { upper, .. } => upper,
            ConfigError::OutOfCorrelationRange { name, .. } => name,
            ConfigError::UnknownGroupingMethod(_) => "grouping.method",
        }
    }
}
