/*
 * Error Module
 *
 * Errors surfaced to callers of the simulation core. Only construction and
 * configuration loading can fail; per-tick math absorbs degenerate vectors
 * locally and never reports them.
 */

use thiserror::Error;

/// Errors raised while building a volume, a flock or its configuration.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A size, speed, force, radius or step value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// An agent kind name that is not part of the closed set.
    #[error("unknown agent kind `{0}`")]
    UnknownKind(String),
    /// The scenario document could not be parsed.
    #[error("malformed scenario: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

// Shorthand used by the validators
pub(crate) fn invalid(message: impl Into<String>) -> SimulationError {
    SimulationError::InvalidConfiguration(message.into())
}
