//! Summary measurements over a particle set, for renderers and logs.

use crate::physics::kinetic_energy;
use blockling_data::{Particle, RoleTable, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParticleStats {
    pub count: usize,
    pub centroid: Vec3,
    /// Largest distance from the centroid to any particle.
    pub bounding_radius: f64,
    pub kinetic_energy: f64,
    pub role_counts: RoleTable<usize>,
}

impl ParticleStats {
    pub fn measure(particles: &[Particle]) -> Self {
        if particles.is_empty() {
            return Self::default();
        }

        let mut role_counts = RoleTable::splat(0usize);
        let mut sum = Vec3::ZERO;
        for p in particles {
            role_counts[p.role] += 1;
            sum += p.position;
        }
        let centroid = sum / particles.len() as f64;
        let bounding_radius = particles
            .iter()
            .map(|p| p.position.distance(centroid))
            .fold(0.0, f64::max);

        Self {
            count: particles.len(),
            centroid,
            bounding_radius,
            kinetic_energy: kinetic_energy(particles),
            role_counts,
        }
    }
}
