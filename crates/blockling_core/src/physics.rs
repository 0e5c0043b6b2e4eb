//! Particle physics step: neighbour repulsion plus formation springs,
//! integrated with damped explicit Euler.
//!
//! The step has no hidden state and draws no randomness. Forces for every
//! particle are computed from the positions at the start of the step (via a
//! freshly built [`SpatialGrid`]) before any particle is moved, and each
//! particle's force is summed in a fixed neighbour order. Identical inputs
//! therefore produce bit-identical outputs, with or without rayon.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::PhysicsConfig;
use crate::error::{CoreError, Result};
use crate::rng::spiral_direction;
use crate::spatial_grid::SpatialGrid;
use blockling_data::{FormationPattern, Particle, Role, RoleTable, Vec3};

/// Number of spiral directions used to separate exactly coincident particles.
const OVERLAP_DIRECTIONS: u32 = 64;

/// Formation target assigned to each particle, `None` when its role has no
/// pattern or the pattern is empty.
///
/// The k-th particle of a role (in slice order) takes the pattern's
/// `k % len` target. Only the first pattern given for a role is used.
pub fn assign_targets(particles: &[Particle], formations: &[FormationPattern]) -> Vec<Option<Vec3>> {
    let mut active: RoleTable<Option<&FormationPattern>> = RoleTable::default();
    for pattern in formations {
        if active[pattern.role].is_none() {
            active[pattern.role] = Some(pattern);
        }
    }

    let mut slots = RoleTable::splat(0usize);
    particles
        .iter()
        .map(|p| {
            let slot = slots[p.role];
            slots[p.role] += 1;
            active[p.role].and_then(|pattern| pattern.target_for(slot))
        })
        .collect()
}

/// Repulsion on particle `idx` from every grid neighbour inside the
/// interaction radius, `k / max(d², min_distance²)` along the separating
/// direction.
pub fn repulsion_force(
    idx: usize,
    particles: &[Particle],
    grid: &SpatialGrid,
    config: &PhysicsConfig,
) -> Vec3 {
    let particle = &particles[idx];
    let k = config.roles[particle.role].repulsion;
    if k <= 0.0 {
        return Vec3::ZERO;
    }

    let radius_sq = config.interaction_radius * config.interaction_radius;
    let min_sq = config.min_distance * config.min_distance;
    let mut force = Vec3::ZERO;

    grid.for_each_neighbor(idx, |other| {
        let delta = particle.position - particles[other].position;
        let dist_sq = delta.length_squared();
        if dist_sq >= radius_sq {
            return;
        }
        let direction = if dist_sq > 0.0 {
            delta / dist_sq.sqrt()
        } else {
            spiral_direction(particle.id % OVERLAP_DIRECTIONS, OVERLAP_DIRECTIONS)
        };
        force += direction * (k / dist_sq.max(min_sq));
    });

    force
}

/// Spring pull toward the assigned formation target.
#[inline]
pub fn spring_force(particle: &Particle, target: Option<Vec3>, config: &PhysicsConfig) -> Vec3 {
    match target {
        Some(target) => (target - particle.position) * config.roles[particle.role].spring,
        None => Vec3::ZERO,
    }
}

/// Net force on every particle, computed from start-of-step positions.
pub fn compute_forces(
    particles: &[Particle],
    formations: &[FormationPattern],
    config: &PhysicsConfig,
) -> Result<Vec<Vec3>> {
    let grid = SpatialGrid::build(particles, config.interaction_radius)?;
    let targets = assign_targets(particles, formations);

    let force_at = |idx: usize| {
        repulsion_force(idx, particles, &grid, config)
            + spring_force(&particles[idx], targets[idx], config)
    };

    #[cfg(feature = "parallel")]
    let forces = (0..particles.len()).into_par_iter().map(force_at).collect();
    #[cfg(not(feature = "parallel"))]
    let forces = (0..particles.len()).map(force_at).collect();

    Ok(forces)
}

#[inline]
fn integrate(particle: &mut Particle, force: Vec3, delta_time: f64, config: &PhysicsConfig) {
    let acceleration = force / particle.effective_mass();
    let mut velocity = (particle.velocity + acceleration * delta_time) * config.damping;

    if config.max_speed > 0.0 {
        let speed_sq = velocity.length_squared();
        if speed_sq > config.max_speed * config.max_speed {
            velocity *= config.max_speed / speed_sq.sqrt();
        }
    }

    particle.velocity = velocity;
    particle.position += velocity * delta_time;
}

/// Rejects a zero, negative or non-finite timestep.
pub fn check_timestep(delta_time: f64) -> Result<()> {
    if delta_time.is_finite() && delta_time > 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidTimestep(delta_time))
    }
}

/// Everything [`step_owned`] can reject, checked without touching any
/// particle: the timestep and the interaction radius used as grid cell size.
pub fn check_step(delta_time: f64, config: &PhysicsConfig) -> Result<()> {
    check_timestep(delta_time)?;
    let radius = config.interaction_radius;
    if !radius.is_finite() || radius <= 0.0 {
        return Err(CoreError::InvalidCellSize(radius));
    }
    Ok(())
}

/// Advances `particles` by one step in place and hands the buffer back.
///
/// This is the form the worker pool uses: the caller moves its buffer in and
/// receives the same allocation back with updated state.
pub fn step_owned(
    mut particles: Vec<Particle>,
    formations: &[FormationPattern],
    delta_time: f64,
    config: &PhysicsConfig,
) -> Result<Vec<Particle>> {
    check_timestep(delta_time)?;
    let forces = compute_forces(&particles, formations, config)?;
    for (particle, force) in particles.iter_mut().zip(forces) {
        integrate(particle, force, delta_time, config);
    }
    Ok(particles)
}

/// Returns updated copies of `particles` after one step; the input is not
/// touched.
pub fn step(
    particles: &[Particle],
    formations: &[FormationPattern],
    delta_time: f64,
    config: &PhysicsConfig,
) -> Result<Vec<Particle>> {
    check_timestep(delta_time)?;
    step_owned(particles.to_vec(), formations, delta_time, config)
}

/// Kinetic energy `½·m·|v|²` summed over all particles.
pub fn kinetic_energy(particles: &[Particle]) -> f64 {
    particles
        .iter()
        .map(|p| 0.5 * p.effective_mass() * p.velocity.length_squared())
        .sum()
}

/// Particles with the given role, in slice order.
pub fn of_role(particles: &[Particle], role: Role) -> impl Iterator<Item = &Particle> {
    particles.iter().filter(move |p| p.role == role)
}
