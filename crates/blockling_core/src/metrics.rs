//! Step metrics and logging setup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Counters for a running simulation session.
pub struct StepMetrics {
    step_count: AtomicU64,
    particle_count: AtomicU64,
    last_step_micros: AtomicU64,
    start_time: Instant,
}

impl Default for StepMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StepMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step_count: AtomicU64::new(0),
            particle_count: AtomicU64::new(0),
            last_step_micros: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a completed physics step with its wall-clock duration.
    pub fn record_step(&self, duration: Duration, particles: usize) {
        let step = self.step_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.particle_count
            .store(particles as u64, Ordering::Relaxed);
        self.last_step_micros
            .store(duration.as_micros() as u64, Ordering::Relaxed);

        // Log at info level every 1000 steps
        if step % 1000 == 0 {
            tracing::info!(
                step = step,
                particles = particles,
                duration_us = duration.as_micros() as u64,
                "Physics step"
            );
        }
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn particle_count(&self) -> u64 {
        self.particle_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn last_step(&self) -> Duration {
        Duration::from_micros(self.last_step_micros.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs a global `tracing` subscriber. `RUST_LOG` overrides the default
/// `info` level; a second call is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = StepMetrics::new();
        assert_eq!(metrics.step_count(), 0);
    }

    #[test]
    fn test_record_step() {
        let metrics = StepMetrics::new();
        metrics.record_step(Duration::from_micros(1500), 60);
        assert_eq!(metrics.step_count(), 1);
        assert_eq!(metrics.particle_count(), 60);
        assert_eq!(metrics.last_step(), Duration::from_micros(1500));
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging();
        init_logging();
    }
}
