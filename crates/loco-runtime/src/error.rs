use loco_core::{ConfigError, InvariantViolation};
use thiserror::Error;

/// Failures surfaced by the headless runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("scenario rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation invariant broken: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("state encoding failed: {0}")]
    Encode(#[from] bincode::Error),
}
