//! # Blockling Core
//!
//! Deterministic core of the blockling creature simulation:
//! - Seed derivation from Bitcoin block data
//! - Mulberry32 random streams and the named-stream multiplexer
//! - Uniform spatial grid for neighbour queries
//! - The pure particle physics step (repulsion + formation springs)
//! - Particle spawning, formation shapes, configuration and metrics
//!
//! ## Example
//!
//! ```
//! use blockling_core::{derive_seed, Multiplexer};
//! use blockling_data::BlockSeed;
//!
//! let seed = derive_seed(&BlockSeed::from_nonce(2083236893)).unwrap();
//! let mut mux = Multiplexer::new(seed);
//! let pick = mux.get_stream("physics").next_int(0, 4).unwrap();
//! assert!((0..=4).contains(&pick));
//! ```

/// Configuration management for physics, pool and session parameters
pub mod config;
/// Error types shared by the core modules
pub mod error;
/// Formation shapes and per-session pattern selection
pub mod formation;
/// Step metrics and logging setup
pub mod metrics;
/// Named random streams over one base seed
pub mod multiplexer;
/// Deterministic particle physics step
pub mod physics;
/// Mulberry32 stream generator
pub mod rng;
/// Block data to seed derivation
pub mod seed;
/// Initial particle placement
pub mod spawn;
/// Uniform grid for neighbour queries
pub mod spatial_grid;
/// Summary measurements over particle sets
pub mod stats;

pub use config::{PhysicsConfig, PoolConfig, SessionConfig, SimConfig};
pub use error::{CoreError, Result};
pub use metrics::{init_logging, StepMetrics};
pub use multiplexer::{Multiplexer, RngStream};
pub use rng::Mulberry32;
pub use seed::{derive_seed, parse_block, Seed};
pub use spatial_grid::SpatialGrid;
pub use stats::ParticleStats;
