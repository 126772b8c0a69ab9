//! Error types for configuration and preset handling.
//!
//! Nothing in the per-tick hot path returns these; they are raised where
//! configuration enters the core (validation, preset load/save).

use crate::types::GroupId;
use thiserror::Error;

/// Errors raised when validating simulation configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("simulation bounds must be finite and positive, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },
    #[error("{name} must be finite and non-negative, got {value}")]
    NegativeScalar { name: &'static str, value: f32 },
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f32 },
    #[error("parameter range for {name} is inverted: min {min} > max {max}")]
    InvertedRange { name: &'static str, min: f32, max: f32 },
    #[error("coefficient matrix holds {cells} cells, expected {groups}x{groups}")]
    MatrixShape { groups: usize, cells: usize },
    #[error("matrix is sized for {matrix} groups but {groups} groups are configured")]
    GroupCountMismatch { matrix: usize, groups: usize },
    #[error("unknown group id {id} (have {groups} groups)")]
    UnknownGroup { id: GroupId, groups: usize },
    #[error("group {id} requests {count} particles, at most {max} allowed")]
    GroupTooLarge { id: GroupId, count: usize, max: usize },
    #[error("group {id} particle count {value} is not a whole number in range")]
    InvalidCount { id: GroupId, value: f32 },
    #[error("coefficient ({row}, {col}) has non-finite {name}")]
    NonFiniteCoefficient {
        row: GroupId,
        col: GroupId,
        name: &'static str,
    },
}

/// Errors raised when reading or writing presets.
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("failed to read or write preset: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed preset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("flat preset holds {found} values, expected {expected}")]
    FlatLength { expected: usize, found: usize },
    #[error("flat preset token {index} ({token:?}) is not a number")]
    FlatToken { index: usize, token: String },
    #[error("flat preset value {index} is not finite")]
    FlatNonFinite { index: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}
