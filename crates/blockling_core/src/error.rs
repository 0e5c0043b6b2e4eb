//! Error types for blockling_core.
//!
//! Configuration errors (bad seeds, bad timesteps) and collection errors
//! (sampling from nothing) are kept as distinct variants so callers can tell
//! them apart without string matching.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Block data could not be turned into a seed.
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Sampling or picking from an empty collection.
    #[error("Cannot sample from an empty collection")]
    EmptyCollection,

    /// Inclusive integer range with `min > max`.
    #[error("Invalid range: min {min} is greater than max {max}")]
    InvalidRange { min: i64, max: i64 },

    /// Physics timestep that is zero, negative or not finite.
    #[error("Invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// Spatial grid cell size that is zero, negative or not finite.
    #[error("Invalid cell size: {0} (must be positive and finite)")]
    InvalidCellSize(f64),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    #[must_use]
    pub fn invalid_seed<S: Into<String>>(msg: S) -> Self {
        Self::InvalidSeed(msg.into())
    }

    /// True for errors caused by bad caller-supplied configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidSeed(_) | Self::InvalidTimestep(_) | Self::InvalidCellSize(_)
        )
    }

    /// True for errors caused by sampling requests over unusable collections.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::EmptyCollection | Self::InvalidRange { .. })
    }
}
