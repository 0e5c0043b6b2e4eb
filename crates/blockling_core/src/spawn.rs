//! Initial particle placement for a creature.

use crate::config::SessionConfig;
use crate::rng::Mulberry32;
use blockling_data::{Particle, Role};

/// Spawns particles for every role, in [`Role::ALL`] order, with sequential
/// ids starting at zero.
///
/// Positions are uniform inside a ball of `spawn_radius`; mass and size vary
/// by ±20% around 1. Everything is drawn from `stream`, so the same stream
/// state always produces the same creature.
pub fn spawn_particles(stream: &mut Mulberry32, config: &SessionConfig) -> Vec<Particle> {
    let total: usize = config.particle_counts.iter().map(|(_, n)| *n).sum();
    let mut particles = Vec::with_capacity(total);

    for role in Role::ALL {
        for _ in 0..config.particle_counts[role] {
            let id = particles.len() as u32;
            particles.push(spawn_one(stream, id, role, config.spawn_radius));
        }
    }

    tracing::debug!(particles = particles.len(), "Spawned creature particles");
    particles
}

fn spawn_one(stream: &mut Mulberry32, id: u32, role: Role, radius: f64) -> Particle {
    let direction = stream.next_unit_vector();
    let distance = radius * stream.next_f64().cbrt();
    let mut particle = Particle::new(id, role, direction * distance);
    particle.mass = stream.next_range(0.8, 1.2);
    particle.size = stream.next_range(0.8, 1.2);
    particle
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockling_data::RoleTable;

    #[test]
    fn test_spawn_counts_and_ids() {
        let config = SessionConfig {
            particle_counts: RoleTable {
                core: 2,
                control: 0,
                movement: 3,
                defense: 1,
                attack: 1,
            },
            ..Default::default()
        };
        let particles = spawn_particles(&mut Mulberry32::new(1), &config);
        assert_eq!(particles.len(), 7);
        assert!(particles.iter().enumerate().all(|(i, p)| p.id == i as u32));
        assert_eq!(particles[0].role, Role::Core);
        assert_eq!(particles[2].role, Role::Movement);
        assert_eq!(particles[6].role, Role::Attack);
    }

    #[test]
    fn test_spawn_inside_radius() {
        let config = SessionConfig::default();
        let particles = spawn_particles(&mut Mulberry32::new(9), &config);
        for p in &particles {
            assert!(p.position.length() <= config.spawn_radius + 1e-9);
            assert!((0.8..1.2).contains(&p.mass));
        }
    }

    #[test]
    fn test_spawn_is_reproducible() {
        let config = SessionConfig::default();
        let a = spawn_particles(&mut Mulberry32::new(77), &config);
        let b = spawn_particles(&mut Mulberry32::new(77), &config);
        assert_eq!(a, b);
    }
}
