//! Error types shared by the simulation crates.

use thiserror::Error;

/// Structural corruption of world state. The simulation cannot continue
/// from a state that produced one of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// An entity points at an object slot that is not loaded.
    #[error("{kind} object {id} is not loaded")]
    MissingObject { kind: &'static str, id: u16 },
    /// A building type declares no parts, so construction can never finish.
    #[error("industry object {object} building type {building} has no parts")]
    EmptyBuilding { object: u8, building: u8 },
    /// An id addressed a slot beyond the table's fixed capacity.
    #[error("{kind} slot {id} is out of range")]
    SlotOutOfRange { kind: &'static str, id: usize },
    /// A slot that should be occupied is empty.
    #[error("{kind} slot {id} is empty")]
    EmptySlot { kind: &'static str, id: usize },
}

/// Problems loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A field holds a value outside its documented range.
    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        range: &'static str,
    },
    /// Cross-field or cross-object inconsistency.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
