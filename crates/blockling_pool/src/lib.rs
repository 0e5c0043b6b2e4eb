//! Task dispatcher for blockling simulations.
//!
//! A [`WorkerPool`] runs registered [`TaskBody`] implementations on dedicated
//! worker threads, at most `max_units_per_type` per task type. `dispatch`
//! returns a [`TaskHandle`] immediately; the handle is a future and can also
//! be waited on from synchronous code.
//!
//! ```
//! use blockling_core::{PhysicsConfig, PoolConfig};
//! use blockling_data::{Particle, Role, Vec3};
//! use blockling_pool::{TaskPayload, WorkerPool, STATS_TASK};
//!
//! let pool = WorkerPool::with_builtin_bodies(PoolConfig::default(), PhysicsConfig::default());
//! let particles = vec![Particle::new(0, Role::Core, Vec3::ZERO)];
//! let (_, stats) = pool
//!     .dispatch(STATS_TASK, TaskPayload::Particles(particles))
//!     .unwrap()
//!     .wait()
//!     .unwrap()
//!     .into_measured()
//!     .unwrap();
//! assert_eq!(stats.count, 1);
//! pool.shutdown();
//! ```

pub mod body;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod payload;
pub mod pool;
mod unit;

pub use body::{PhysicsBody, StatsBody, TaskBody, PHYSICS_TASK, STATS_TASK};
pub use error::{PoolError, Result, TaskFault};
pub use handle::TaskHandle;
pub use metrics::{PoolMetrics, PoolMetricsSnapshot};
pub use payload::{PhysicsRequest, TaskPayload};
pub use pool::WorkerPool;
