//! A creature session: block data in, pooled physics steps out.
//!
//! Everything random is drawn on the session side before work is handed to
//! the pool: particle placement from the `particles` stream and the formation
//! choice from the `formation` stream. Physics itself is deterministic, so
//! two sessions built from the same block and config stay bit-identical for
//! as many steps as they are driven.

use crate::error::Result;
use blockling_core::formation::FormationLibrary;
use blockling_core::spawn::spawn_particles;
use blockling_core::{derive_seed, physics, Multiplexer, ParticleStats, RngStream, Seed, SimConfig, StepMetrics};
use blockling_data::{BlockSeed, FormationPattern, Particle};
use blockling_pool::{PhysicsRequest, PoolError, TaskPayload, WorkerPool, PHYSICS_TASK, STATS_TASK};
use std::sync::Arc;
use std::time::Instant;

pub const PARTICLE_STREAM: &str = "particles";
pub const FORMATION_STREAM: &str = "formation";

pub struct Simulation {
    seed: Seed,
    multiplexer: Multiplexer,
    particles: Vec<Particle>,
    formations: Arc<[FormationPattern]>,
    metrics: StepMetrics,
}

impl Simulation {
    pub fn from_block(block: &BlockSeed, config: &SimConfig, library: &FormationLibrary) -> Result<Self> {
        let seed = derive_seed(block)?;
        let mut multiplexer = Multiplexer::new(seed);

        let particles = spawn_particles(multiplexer.get_stream(PARTICLE_STREAM), &config.session);
        let formations: Arc<[FormationPattern]> =
            library.select(multiplexer.get_stream(FORMATION_STREAM))?.into();

        tracing::info!(
            seed,
            particles = particles.len(),
            formations = formations.len(),
            "Session created"
        );

        Ok(Self {
            seed,
            multiplexer,
            particles,
            formations,
            metrics: StepMetrics::new(),
        })
    }

    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn formations(&self) -> &[FormationPattern] {
        &self.formations
    }

    pub fn metrics(&self) -> &StepMetrics {
        &self.metrics
    }

    /// Named stream for callers that need extra session randomness. Streams
    /// used by the session itself keep their position, so draws taken here
    /// never disturb them unless the same name is requested.
    pub fn stream(&mut self, name: &str) -> &mut RngStream {
        self.multiplexer.get_stream(name)
    }

    /// Runs one physics step on the pool.
    ///
    /// The particle buffer is moved into the task and the result moved back.
    /// If the task fails before touching the buffer, the pool hands it back
    /// and the particles are as they were before the step. A body that panics
    /// takes the buffer with it; the session is then left without particles.
    pub async fn step(&mut self, pool: &WorkerPool, delta_time: f64) -> Result<()> {
        physics::check_timestep(delta_time)?;

        let formations = Arc::clone(&self.formations);
        let start = Instant::now();
        let payload = self
            .round_trip(pool, PHYSICS_TASK, |particles| {
                TaskPayload::PhysicsStep(PhysicsRequest::new(particles, formations, delta_time))
            })
            .await?;

        match payload {
            TaskPayload::Particles(particles) => {
                self.particles = particles;
                self.metrics.record_step(start.elapsed(), self.particles.len());
                Ok(())
            }
            other => Err(self.unexpected("particles", other).into()),
        }
    }

    /// Runs `steps` consecutive steps, stopping at the first failure.
    pub async fn run(&mut self, pool: &WorkerPool, steps: u64, delta_time: f64) -> Result<()> {
        for _ in 0..steps {
            self.step(pool, delta_time).await?;
        }
        Ok(())
    }

    /// Measures the current particles on the pool. The buffer travels to the
    /// stats task and back without being copied.
    pub async fn stats(&mut self, pool: &WorkerPool) -> Result<ParticleStats> {
        let payload = self.round_trip(pool, STATS_TASK, TaskPayload::Particles).await?;
        match payload {
            TaskPayload::Measured { particles, stats } => {
                self.particles = particles;
                Ok(stats)
            }
            other => Err(self.unexpected("measured", other).into()),
        }
    }

    /// Measures the current particles on the calling thread.
    pub fn measure(&self) -> ParticleStats {
        ParticleStats::measure(&self.particles)
    }

    /// Moves the particle buffer into a `task_type` task and waits for its
    /// result. Whenever an error carries the unconsumed payload, the buffer
    /// is put back before the error is returned.
    async fn round_trip(
        &mut self,
        pool: &WorkerPool,
        task_type: &str,
        wrap: impl FnOnce(Vec<Particle>) -> TaskPayload,
    ) -> std::result::Result<TaskPayload, PoolError> {
        let payload = wrap(std::mem::take(&mut self.particles));
        let handle = match pool.try_dispatch(task_type, payload) {
            Ok(handle) => handle,
            Err((err, payload)) => {
                self.restore(Some(payload), &err);
                return Err(err);
            }
        };

        handle.await.map_err(|mut err| {
            let payload = err.take_payload();
            self.restore(payload, &err);
            err
        })
    }

    fn restore(&mut self, payload: Option<TaskPayload>, err: &PoolError) {
        match payload.and_then(TaskPayload::into_buffer) {
            Some(particles) => {
                self.particles = particles;
                tracing::warn!(error = %err, "Pool task failed, particles restored");
            }
            None => {
                tracing::error!(error = %err, "Pool task failed and consumed the particle buffer");
            }
        }
    }

    /// Puts back the buffer from a result of the wrong kind.
    fn unexpected(&mut self, expected: &'static str, payload: TaskPayload) -> PoolError {
        let err = PoolError::UnexpectedPayload {
            expected,
            found: payload.kind(),
        };
        self.restore(Some(payload), &err);
        err
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("seed", &self.seed)
            .field("particles", &self.particles.len())
            .field("formations", &self.formations.len())
            .field("steps", &self.metrics.step_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockling_core::PoolConfig;

    fn session(nonce: i64) -> Simulation {
        let config = SimConfig::default();
        let library = FormationLibrary::standard(
            &config.session.particle_counts,
            config.session.formation_radius,
        );
        Simulation::from_block(&BlockSeed::from_nonce(nonce), &config, &library).unwrap()
    }

    fn pool() -> WorkerPool {
        let config = SimConfig::default();
        WorkerPool::with_builtin_bodies(PoolConfig::default(), config.physics)
    }

    #[test]
    fn test_same_block_same_session() {
        let a = session(2083236893);
        let b = session(2083236893);
        assert_eq!(a.seed(), 2083236893);
        assert_eq!(a.particles(), b.particles());
        assert_eq!(a.formations(), b.formations());
        assert_eq!(a.particles().len(), 60);
    }

    #[test]
    fn test_missing_nonce_is_rejected() {
        let config = SimConfig::default();
        let result = Simulation::from_block(&BlockSeed::default(), &config, &FormationLibrary::new());
        assert!(matches!(
            result,
            Err(crate::SessionError::Core(blockling_core::CoreError::InvalidSeed(_)))
        ));
    }

    #[tokio::test]
    async fn test_step_matches_direct_physics() {
        let pool = pool();
        let mut sim = session(7);
        let expected = physics::step(
            sim.particles(),
            sim.formations(),
            0.016,
            &SimConfig::default().physics,
        )
        .unwrap();

        sim.step(&pool, 0.016).await.unwrap();
        assert_eq!(sim.particles(), expected.as_slice());
        assert_eq!(sim.metrics().step_count(), 1);
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_bad_timestep_leaves_particles_untouched() {
        let pool = pool();
        let mut sim = session(7);
        let before = sim.particles().to_vec();
        assert!(sim.step(&pool, 0.0).await.is_err());
        assert_eq!(sim.particles(), before.as_slice());
        assert_eq!(pool.metrics().snapshot().dispatched, 0);
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_failed_task_restores_particles() {
        let pool = WorkerPool::new(PoolConfig::default());
        pool.register(PHYSICS_TASK, blockling_pool::StatsBody);
        let mut sim = session(7);
        let before = sim.particles().to_vec();
        let buffer = sim.particles().as_ptr();
        let err = sim.step(&pool, 0.016).await.unwrap_err();
        assert!(matches!(err, crate::SessionError::Pool(_)));
        assert_eq!(sim.particles(), before.as_slice());
        assert_eq!(sim.particles().as_ptr(), buffer, "restored buffer should be the original");
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_unknown_task_restores_particles() {
        let pool = WorkerPool::new(PoolConfig::default());
        let mut sim = session(7);
        let before = sim.particles().to_vec();
        assert!(sim.step(&pool, 0.016).await.is_err());
        assert!(sim.stats(&pool).await.is_err());
        assert_eq!(sim.particles(), before.as_slice());
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_panicking_body_consumes_buffer() {
        let pool = WorkerPool::new(PoolConfig::default());
        pool.register(PHYSICS_TASK, |_: TaskPayload| -> std::result::Result<TaskPayload, blockling_pool::TaskFault> {
            panic!("boom")
        });
        let mut sim = session(7);
        assert!(sim.step(&pool, 0.016).await.is_err());
        assert!(sim.particles().is_empty());
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_stats_counts_every_particle() {
        let pool = pool();
        let mut sim = session(11);
        let buffer = sim.particles().as_ptr();
        let stats = sim.stats(&pool).await.unwrap();
        assert_eq!(stats.count, sim.particles().len());
        assert_eq!(stats.role_counts, SimConfig::default().session.particle_counts);
        assert_eq!(sim.particles().as_ptr(), buffer, "stats should not copy the buffer");
        assert_eq!(sim.measure(), stats);
        pool.shutdown();
    }

    #[tokio::test]
    async fn test_formations_are_shared_not_copied() {
        let mut sim = session(7);
        let formations = Arc::clone(&sim.formations);
        let pool = pool();
        sim.run(&pool, 3, 0.016).await.unwrap();
        assert!(Arc::ptr_eq(&formations, &sim.formations));
        assert_eq!(Arc::strong_count(&formations), 2);
        pool.shutdown();
    }
}
