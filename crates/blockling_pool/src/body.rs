//! Task bodies: the code a worker unit runs for each task of its type.

use crate::error::{TaskError, TaskFault};
use crate::payload::{PhysicsRequest, TaskPayload};
use blockling_core::{physics, ParticleStats, PhysicsConfig};

pub const PHYSICS_TASK: &str = "physics";
pub const STATS_TASK: &str = "stats";

/// Work executed inside a unit. Bodies are shared read-only between the units
/// of a task type, so they hold configuration only, never mutable state.
///
/// A body that rejects its input before touching it should hand the payload
/// back through [`TaskError::returning`], so the caller keeps its buffers.
pub trait TaskBody: Send + Sync + 'static {
    fn execute(&self, payload: TaskPayload) -> Result<TaskPayload, TaskError>;
}

impl<F> TaskBody for F
where
    F: Fn(TaskPayload) -> Result<TaskPayload, TaskFault> + Send + Sync + 'static,
{
    fn execute(&self, payload: TaskPayload) -> Result<TaskPayload, TaskError> {
        self(payload).map_err(TaskError::from)
    }
}

fn wrong_kind(task: &str, payload: TaskPayload) -> TaskError {
    let fault = TaskFault::MalformedPayload(format!(
        "{task} task cannot take a {} payload",
        payload.kind()
    ));
    TaskError::returning(fault, payload)
}

/// Runs one physics step. Accepts a [`TaskPayload::PhysicsStep`] (buffers
/// moved in) or an [`TaskPayload::Encoded`] JSON request, and answers with
/// [`TaskPayload::Particles`].
#[derive(Debug, Clone, Default)]
pub struct PhysicsBody {
    config: PhysicsConfig,
}

impl PhysicsBody {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    fn run(&self, request: PhysicsRequest) -> Result<TaskPayload, TaskError> {
        if let Err(e) = physics::check_step(request.delta_time, &self.config) {
            return Err(TaskError::returning(e, TaskPayload::PhysicsStep(request)));
        }
        let PhysicsRequest {
            particles,
            formations,
            delta_time,
        } = request;
        let particles = physics::step_owned(particles, &formations, delta_time, &self.config)?;
        Ok(TaskPayload::Particles(particles))
    }
}

impl TaskBody for PhysicsBody {
    fn execute(&self, payload: TaskPayload) -> Result<TaskPayload, TaskError> {
        match payload {
            TaskPayload::PhysicsStep(request) => self.run(request),
            TaskPayload::Encoded(bytes) => match serde_json::from_slice::<PhysicsRequest>(&bytes) {
                Ok(request) => self.run(request),
                Err(e) => Err(TaskError::returning(
                    TaskFault::MalformedPayload(format!("undecodable physics request: {e}")),
                    TaskPayload::Encoded(bytes),
                )),
            },
            other => Err(wrong_kind(PHYSICS_TASK, other)),
        }
    }
}

/// Measures a particle buffer and hands it back alongside the
/// [`ParticleStats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsBody;

impl TaskBody for StatsBody {
    fn execute(&self, payload: TaskPayload) -> Result<TaskPayload, TaskError> {
        match payload {
            TaskPayload::Particles(particles) => {
                let stats = ParticleStats::measure(&particles);
                Ok(TaskPayload::Measured { particles, stats })
            }
            other => Err(wrong_kind(STATS_TASK, other)),
        }
    }
}
