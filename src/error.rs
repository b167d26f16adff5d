//! Error types for actions and configuration
//!
//! Rejected actions never modify state. The session dispatcher logs and drops
//! them so gameplay treats them as no-ops.

use thiserror::Error;

use crate::sim::GamePhase;

/// Why a named action was rejected
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    #[error("{action} is not allowed during {phase:?}")]
    InvalidTransition {
        action: &'static str,
        phase: GamePhase,
    },
    #[error("treasure {id} was already collected")]
    AlreadyCollected { id: String },
    #[error("probability {value} is outside (0, 1]")]
    InvalidProbability { value: f64 },
    #[error("level {level} is outside 1..={max}")]
    LevelOutOfRange { level: u32, max: u32 },
    #[error("level needs {required} treasures (found {found})")]
    LevelIncomplete { found: usize, required: usize },
    #[error("no parkour challenge is available")]
    ParkourUnavailable,
}

/// Raised when tuning data violates its invariants
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be between 0 and 1 (got {value:.3})")]
    ProbabilityRange { field: String, value: f64 },
    #[error("weather weights sum to {sum:.3}, expected 1.0")]
    WeatherWeights { sum: f64 },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("level table is empty")]
    NoLevels,
    #[error("level {level} lists {count} treasures, expected 1..={max}")]
    TreasureCount { level: usize, count: usize, max: usize },
}
