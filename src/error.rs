//! Error types for configuration and per-entity simulation anomalies.
//!
//! Configuration problems are fatal and surface when a [`Tuning`] is built.
//! Anomalies are per-entity: the offending tank or projectile is discarded,
//! the rest of the tick runs, and the anomaly is reported to the caller.
//!
//! [`Tuning`]: crate::tuning::Tuning

use thiserror::Error;

use crate::sim::state::{PlayerId, TankId};

/// Invalid configuration value supplied by the configuration collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuningError {
    /// Tuning JSON could not be parsed
    #[error("tuning parse error: {0}")]
    Parse(String),
    /// A value that must be finite and strictly positive was not
    #[error("{name} must be finite and > 0, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    /// A probability outside [0, 1]
    #[error("{name} must be a probability in [0, 1], got {value}")]
    NotProbability { name: &'static str, value: f32 },
    /// A min/max pair with min > max
    #[error("{name} range is inverted: min {min} > max {max}")]
    InvertedRange { name: &'static str, min: f32, max: f32 },
    /// A count that must be at least one
    #[error("{name} must be at least 1")]
    ZeroCount { name: &'static str },
}

impl From<serde_json::Error> for TuningError {
    fn from(err: serde_json::Error) -> Self {
        TuningError::Parse(err.to_string())
    }
}

/// Per-entity invariant violation detected during a tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimAnomaly {
    /// Projectile position or heading is NaN/infinite
    #[error("projectile {id} has non-finite state")]
    NonFiniteProjectile { id: u32 },
    /// Projectile owner is not a tank in this world
    #[error("projectile {id} references unknown owner tank {owner:?}")]
    UnknownOwner { id: u32, owner: TankId },
    /// Tank position, heading or speed is NaN/infinite
    #[error("tank {tank:?} (player {player:?}) has non-finite state")]
    NonFiniteTank { tank: TankId, player: PlayerId },
}
