use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

pub type Vec3 = glam::DVec3;

/// Functional category of a particle. Each role carries its own physics
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Core,
    Control,
    Movement,
    Defense,
    Attack,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Core,
        Role::Control,
        Role::Movement,
        Role::Defense,
        Role::Attack,
    ];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Role::Core => 0,
            Role::Control => 1,
            Role::Movement => 2,
            Role::Defense => 3,
            Role::Attack => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Core => "core",
            Role::Control => "control",
            Role::Movement => "movement",
            Role::Defense => "defense",
            Role::Attack => "attack",
        }
    }
}

/// One value per [`Role`]. Missing keys deserialize to `T::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleTable<T> {
    pub core: T,
    pub control: T,
    pub movement: T,
    pub defense: T,
    pub attack: T,
}

impl<T: Clone> RoleTable<T> {
    pub fn splat(value: T) -> Self {
        Self {
            core: value.clone(),
            control: value.clone(),
            movement: value.clone(),
            defense: value.clone(),
            attack: value,
        }
    }
}

impl<T> RoleTable<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Role, &T)> {
        Role::ALL.into_iter().map(move |r| (r, &self[r]))
    }
}

impl<T> Index<Role> for RoleTable<T> {
    type Output = T;

    fn index(&self, role: Role) -> &T {
        match role {
            Role::Core => &self.core,
            Role::Control => &self.control,
            Role::Movement => &self.movement,
            Role::Defense => &self.defense,
            Role::Attack => &self.attack,
        }
    }
}

impl<T> IndexMut<Role> for RoleTable<T> {
    fn index_mut(&mut self, role: Role) -> &mut T {
        match role {
            Role::Core => &mut self.core,
            Role::Control => &mut self.control,
            Role::Movement => &mut self.movement,
            Role::Defense => &mut self.defense,
            Role::Attack => &mut self.attack,
        }
    }
}

/// A single simulated particle of a creature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub role: Role,
    pub position: Vec3,
    pub velocity: Vec3,
    pub mass: f64,
    pub size: f64,
}

impl Particle {
    pub fn new(id: u32, role: Role, position: Vec3) -> Self {
        Self {
            id,
            role,
            position,
            velocity: Vec3::ZERO,
            mass: 1.0,
            size: 1.0,
        }
    }

    /// Mass used for integration. Degenerate masses integrate as unit mass.
    #[inline]
    pub fn effective_mass(&self) -> f64 {
        if self.mass.is_finite() && self.mass > 0.0 {
            self.mass
        } else {
            1.0
        }
    }
}
