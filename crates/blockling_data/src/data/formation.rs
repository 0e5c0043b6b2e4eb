use super::particle::{Role, Vec3};
use serde::{Deserialize, Serialize};

/// Target positions that particles of one role are spring-pulled toward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationPattern {
    pub role: Role,
    #[serde(rename = "targetPositions", alias = "target_positions")]
    pub target_positions: Vec<Vec3>,
}

impl FormationPattern {
    pub fn new(role: Role, target_positions: Vec<Vec3>) -> Self {
        Self {
            role,
            target_positions,
        }
    }

    pub fn empty(role: Role) -> Self {
        Self::new(role, Vec::new())
    }

    /// Target for the `slot`-th particle of this role, wrapping around when the
    /// pattern has fewer positions than particles.
    #[inline]
    pub fn target_for(&self, slot: usize) -> Option<Vec3> {
        if self.target_positions.is_empty() {
            None
        } else {
            Some(self.target_positions[slot % self.target_positions.len()])
        }
    }
}
