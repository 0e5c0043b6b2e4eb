pub mod macros;

use blockling_core::formation::FormationLibrary;
use blockling_core::{PhysicsConfig, PoolConfig, SimConfig};
use blockling_data::{BlockSeed, Particle, Role, Vec3};
use blockling_lib::Simulation;
use blockling_pool::WorkerPool;

/// Genesis block nonce, used wherever a real-world seed is wanted.
#[allow(dead_code)]
pub const GENESIS_NONCE: i64 = 2_083_236_893;

#[allow(dead_code)]
pub struct ParticleSetBuilder {
    particles: Vec<Particle>,
}

#[allow(dead_code)]
impl ParticleSetBuilder {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    pub fn with(mut self, role: Role, position: Vec3) -> Self {
        let id = self.particles.len() as u32;
        self.particles.push(Particle::new(id, role, position));
        self
    }

    pub fn with_moving(mut self, role: Role, position: Vec3, velocity: Vec3) -> Self {
        let id = self.particles.len() as u32;
        let mut particle = Particle::new(id, role, position);
        particle.velocity = velocity;
        self.particles.push(particle);
        self
    }

    /// `count` particles of `role` on a line along x, `spacing` apart.
    pub fn with_line(mut self, role: Role, count: usize, spacing: f64) -> Self {
        for i in 0..count {
            self = self.with(role, Vec3::new(i as f64 * spacing, 0.0, 0.0));
        }
        self
    }

    pub fn build(self) -> Vec<Particle> {
        self.particles
    }
}

#[allow(dead_code)]
pub struct SessionBuilder {
    config: SimConfig,
    block: BlockSeed,
}

#[allow(dead_code)]
impl SessionBuilder {
    pub fn new(nonce: i64) -> Self {
        Self {
            config: SimConfig::default(),
            block: BlockSeed::from_nonce(nonce),
        }
    }

    pub fn with_hash(mut self, hash: &str, timestamp_seconds: i64) -> Self {
        self.block = self.block.with_hash(hash, timestamp_seconds);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn pool(&self) -> WorkerPool {
        WorkerPool::with_builtin_bodies(self.config.pool.clone(), self.config.physics.clone())
    }

    pub fn build(&self) -> Simulation {
        let library = FormationLibrary::standard(
            &self.config.session.particle_counts,
            self.config.session.formation_radius,
        );
        Simulation::from_block(&self.block, &self.config, &library)
            .expect("Failed to create session")
    }
}

#[allow(dead_code)]
pub fn pool_with(max_units_per_type: usize, idle_timeout_ms: u64) -> WorkerPool {
    WorkerPool::with_builtin_bodies(
        PoolConfig {
            max_units_per_type,
            idle_timeout_ms,
        },
        PhysicsConfig::default(),
    )
}
