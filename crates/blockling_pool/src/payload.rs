//! Messages exchanged with worker units.
//!
//! Payloads are moved into `dispatch` and moved back out of the result, so
//! particle buffers change hands without being copied and are never reachable
//! from both sides at once. Random streams have no variant here: anything
//! random is drawn before dispatch and sent as plain values.

use crate::error::{PoolError, Result};
use blockling_core::ParticleStats;
use blockling_data::{FormationPattern, Particle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Input for one physics step. Formations are shared read-only, so a session
/// can send the same patterns every step without copying them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsRequest {
    pub particles: Vec<Particle>,
    pub formations: Arc<[FormationPattern]>,
    pub delta_time: f64,
}

impl PhysicsRequest {
    pub fn new(
        particles: Vec<Particle>,
        formations: impl Into<Arc<[FormationPattern]>>,
        delta_time: f64,
    ) -> Self {
        Self {
            particles,
            formations: formations.into(),
            delta_time,
        }
    }

    /// JSON form accepted by bodies that take [`TaskPayload::Encoded`].
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload {
    PhysicsStep(PhysicsRequest),
    Particles(Vec<Particle>),
    Measured {
        particles: Vec<Particle>,
        stats: ParticleStats,
    },
    /// Serialized request bytes, decoded by the receiving body.
    Encoded(Vec<u8>),
}

impl TaskPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PhysicsStep(_) => "physics-step",
            Self::Particles(_) => "particles",
            Self::Measured { .. } => "measured",
            Self::Encoded(_) => "encoded",
        }
    }

    /// The particle buffer carried by this payload, whatever its kind.
    pub fn into_buffer(self) -> Option<Vec<Particle>> {
        match self {
            Self::PhysicsStep(request) => Some(request.particles),
            Self::Particles(particles) | Self::Measured { particles, .. } => Some(particles),
            Self::Encoded(_) => None,
        }
    }

    pub fn into_particles(self) -> Result<Vec<Particle>> {
        match self {
            Self::Particles(particles) => Ok(particles),
            other => Err(PoolError::UnexpectedPayload {
                expected: "particles",
                found: other.kind(),
            }),
        }
    }

    pub fn into_measured(self) -> Result<(Vec<Particle>, ParticleStats)> {
        match self {
            Self::Measured { particles, stats } => Ok((particles, stats)),
            other => Err(PoolError::UnexpectedPayload {
                expected: "measured",
                found: other.kind(),
            }),
        }
    }
}
