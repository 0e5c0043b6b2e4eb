//! Geometric formation patterns and per-session pattern selection.
//!
//! Trait content decides which patterns a creature may use; this module only
//! provides the shapes and picks among the candidates with a random stream
//! before any physics work is dispatched.

use crate::error::Result;
use crate::rng::{spiral_direction, Mulberry32};
use blockling_data::{FormationPattern, Role, RoleTable, Vec3};
use std::f64::consts::TAU;

/// `count` points evenly spaced on a horizontal circle.
pub fn ring(role: Role, count: usize, radius: f64, height: f64) -> FormationPattern {
    let points = (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            Vec3::new(radius * angle.cos(), height, radius * angle.sin())
        })
        .collect();
    FormationPattern::new(role, points)
}

/// `count` points spread over a sphere of `radius` along a golden-angle
/// spiral.
pub fn shell(role: Role, count: usize, radius: f64) -> FormationPattern {
    let total = count as u32;
    let points = (0..total)
        .map(|i| spiral_direction(i, total) * radius)
        .collect();
    FormationPattern::new(role, points)
}

/// `count` points stacked on the vertical axis, centred on the origin.
pub fn column(role: Role, count: usize, spacing: f64) -> FormationPattern {
    let offset = (count.saturating_sub(1)) as f64 * spacing / 2.0;
    let points = (0..count)
        .map(|i| Vec3::new(0.0, i as f64 * spacing - offset, 0.0))
        .collect();
    FormationPattern::new(role, points)
}

/// `count` points on a cubic lattice, filled x first, centred on the origin.
pub fn lattice(role: Role, count: usize, spacing: f64) -> FormationPattern {
    let side = (count as f64).cbrt().ceil().max(1.0) as usize;
    let offset = (side - 1) as f64 * spacing / 2.0;
    let points = (0..count)
        .map(|i| {
            let x = i % side;
            let y = (i / side) % side;
            let z = i / (side * side);
            Vec3::new(x as f64, y as f64, z as f64) * spacing - Vec3::splat(offset)
        })
        .collect();
    FormationPattern::new(role, points)
}

/// Candidate patterns per role.
#[derive(Debug, Clone, Default)]
pub struct FormationLibrary {
    candidates: RoleTable<Vec<FormationPattern>>,
}

impl FormationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: FormationPattern) -> &mut Self {
        self.candidates[pattern.role].push(pattern);
        self
    }

    pub fn candidates(&self, role: Role) -> &[FormationPattern] {
        &self.candidates[role]
    }

    /// Ring, shell, column and lattice candidates for every role, sized for
    /// `counts[role]` particles. Outer roles get wider shapes.
    pub fn standard(counts: &RoleTable<usize>, radius: f64) -> Self {
        let mut library = Self::new();
        for role in Role::ALL {
            let n = counts[role].max(1);
            let r = radius * role_scale(role);
            library
                .add(ring(role, n, r, 0.0))
                .add(shell(role, n, r))
                .add(column(role, n, r / n as f64 * 2.0))
                .add(lattice(role, n, r / 2.0));
        }
        library
    }

    /// Picks one candidate per role from `stream`, in [`Role::ALL`] order.
    /// Roles without candidates are left out and consume no draws.
    pub fn select(&self, stream: &mut Mulberry32) -> Result<Vec<FormationPattern>> {
        let mut chosen = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            let candidates = &self.candidates[role];
            if candidates.is_empty() {
                continue;
            }
            chosen.push(stream.next_item(candidates)?.clone());
        }
        Ok(chosen)
    }
}

fn role_scale(role: Role) -> f64 {
    match role {
        Role::Core => 0.3,
        Role::Control => 0.6,
        Role::Movement => 1.0,
        Role::Defense => 1.2,
        Role::Attack => 1.5,
    }
}
