//! Blockling: deterministic particle creatures seeded from block data.
//!
//! The heavy lifting lives in the workspace crates: `blockling_data` (plain
//! data types), `blockling_core` (random streams, spatial grid, physics) and
//! `blockling_pool` (the task dispatcher). This crate ties them into a
//! [`Simulation`] session.

pub mod error;
pub mod simulation;

pub use error::{Result, SessionError};
pub use simulation::{Simulation, FORMATION_STREAM, PARTICLE_STREAM};
