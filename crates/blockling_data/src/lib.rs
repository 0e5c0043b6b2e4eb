//! Plain data shared by the blockling crates.
//!
//! Nothing in here owns behaviour beyond trivial accessors: block records come
//! from the chain collaborator, formation patterns from trait content, and
//! particles are owned by whoever drives the simulation.

pub mod data;

pub use data::block::BlockSeed;
pub use data::formation::FormationPattern;
pub use data::particle::{Particle, Role, RoleTable, Vec3};
