//! The worker pool: routes tasks to per-type groups of worker units.
//!
//! Each task type owns at most `max_units_per_type` live units. A dispatch
//! prefers an idle unit, spawns a new one while the group is below its cap,
//! and otherwise queues on the least-loaded unit (the oldest one on ties).
//! Units that fail a task are retired: they leave the group immediately, run
//! nothing further, and answer whatever was already queued on them with
//! [`PoolError::UnitRetired`] (payload included) before their thread exits.
//! At most `max_units_per_type` units of a type ever execute at once.

use crate::body::{PhysicsBody, StatsBody, TaskBody, PHYSICS_TASK, STATS_TASK};
use crate::error::{PoolError, Result};
use crate::handle::TaskHandle;
use crate::metrics::PoolMetrics;
use crate::payload::TaskPayload;
use crate::unit::{Job, UnitContext, WorkerUnit};
use blockling_core::{PhysicsConfig, PoolConfig};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Default)]
struct UnitGroup {
    /// Spawn order: index 0 is the oldest unit.
    units: Vec<WorkerUnit>,
}

impl UnitGroup {
    /// Moves every unit that no longer accepts work out of the group.
    fn prune(&mut self, draining: &mut Vec<WorkerUnit>) {
        if self.units.iter().all(|u| u.state.is_available()) {
            return;
        }
        let (live, gone): (Vec<_>, Vec<_>) = std::mem::take(&mut self.units)
            .into_iter()
            .partition(|u| u.state.is_available());
        self.units = live;
        draining.extend(gone);
    }
}

#[derive(Default)]
struct PoolInner {
    groups: HashMap<String, UnitGroup>,
    bodies: HashMap<String, Arc<dyn TaskBody>>,
    /// Retired or terminated units whose threads may still be finishing.
    draining: Vec<WorkerUnit>,
    next_unit_id: u64,
    shut_down: bool,
}

impl PoolInner {
    fn forget_finished(&mut self) {
        // Dropping a finished unit detaches a thread that is already exiting.
        self.draining.retain(|u| u.state.in_flight() > 0);
    }
}

pub struct WorkerPool {
    config: PoolConfig,
    epoch: Instant,
    metrics: Arc<PoolMetrics>,
    inner: Mutex<PoolInner>,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            epoch: Instant::now(),
            metrics: Arc::new(PoolMetrics::new()),
            inner: Mutex::new(PoolInner::default()),
        }
    }

    /// A pool with the `physics` and `stats` bodies registered.
    pub fn with_builtin_bodies(config: PoolConfig, physics: PhysicsConfig) -> Self {
        let pool = Self::new(config);
        pool.register(PHYSICS_TASK, PhysicsBody::new(physics));
        pool.register(STATS_TASK, StatsBody);
        pool
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Installs the body for `task_type`.
    ///
    /// Units running an older body for that type finish the work already
    /// queued on them and exit before this returns. Dispatches wait for the
    /// swap, so old and new units never run side by side.
    pub fn register(&self, task_type: &str, body: impl TaskBody) {
        let mut inner = self.lock();
        inner.bodies.insert(task_type.to_owned(), Arc::new(body));
        if let Some(group) = inner.groups.remove(task_type) {
            tracing::debug!(task_type, units = group.units.len(), "Body replaced, joining old units");
            for unit in group.units {
                unit.join();
            }
        }
    }

    pub fn is_registered(&self, task_type: &str) -> bool {
        self.lock().bodies.contains_key(task_type)
    }

    /// Queues `payload` on a unit of `task_type` and returns a handle to its
    /// result. Never blocks on task execution.
    pub fn dispatch(&self, task_type: &str, payload: TaskPayload) -> Result<TaskHandle> {
        self.try_dispatch(task_type, payload).map_err(|(e, _)| e)
    }

    /// Like [`dispatch`](Self::dispatch), but hands the payload back when it
    /// could not be queued.
    pub fn try_dispatch(
        &self,
        task_type: &str,
        payload: TaskPayload,
    ) -> std::result::Result<TaskHandle, (PoolError, TaskPayload)> {
        let mut inner = self.lock();
        if inner.shut_down {
            return Err((PoolError::ShutDown, payload));
        }
        let Some(body) = inner.bodies.get(task_type).cloned() else {
            return Err((PoolError::UnknownTaskType(task_type.to_owned()), payload));
        };

        let (handle, reply) = TaskHandle::new(task_type);
        let mut job = Job { payload, reply };
        let cap = self.config.max_units_per_type.max(1);

        inner.forget_finished();
        let PoolInner {
            groups,
            draining,
            next_unit_id,
            ..
        } = &mut *inner;
        let group = groups.entry(task_type.to_owned()).or_default();

        loop {
            group.prune(draining);

            let slot = if let Some(i) = group.units.iter().position(|u| u.state.is_idle()) {
                i
            } else if group.units.len() < cap {
                let id = *next_unit_id;
                *next_unit_id += 1;
                let unit = match WorkerUnit::spawn(id, Arc::clone(&body), self.unit_context(task_type)) {
                    Ok(unit) => unit,
                    Err(e) => return Err((PoolError::Spawn(e), job.payload)),
                };
                group.units.push(unit);
                self.metrics.record_spawn(task_type, group.units.len());
                tracing::debug!(task_type, unit = id, live = group.units.len(), "Spawned worker unit");
                group.units.len() - 1
            } else {
                // min_by_key keeps the first minimum, which is the oldest unit.
                match group
                    .units
                    .iter()
                    .enumerate()
                    .min_by_key(|(_, u)| u.state.in_flight())
                {
                    Some((i, _)) => i,
                    None => continue,
                }
            };

            let unit = &group.units[slot];
            if !unit.state.try_acquire() {
                // Lost a race with retirement or idle termination.
                continue;
            }
            match unit.send(job) {
                Ok(()) => {
                    self.metrics.record_dispatch();
                    tracing::trace!(task_type, unit = unit.id, "Task dispatched");
                    return Ok(handle);
                }
                Err(returned) => job = returned,
            }
        }
    }

    fn unit_context(&self, task_type: &str) -> UnitContext {
        UnitContext {
            task_type: Arc::from(task_type),
            idle_timeout: self.config.idle_timeout(),
            epoch: self.epoch,
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Live units of `task_type`: neither retired nor terminated.
    pub fn live_units(&self, task_type: &str) -> usize {
        self.lock()
            .groups
            .get(task_type)
            .map_or(0, |g| g.units.iter().filter(|u| u.state.is_available()).count())
    }

    /// Live units of `task_type` with nothing in flight.
    pub fn idle_units(&self, task_type: &str) -> usize {
        self.lock()
            .groups
            .get(task_type)
            .map_or(0, |g| g.units.iter().filter(|u| u.state.is_idle()).count())
    }

    /// Terminates every unit that has been idle for at least the configured
    /// timeout, without waiting for the units to notice on their own. Returns
    /// how many were terminated.
    pub fn reap_idle(&self) -> usize {
        self.reap_idle_older_than(self.config.idle_timeout())
    }

    fn reap_idle_older_than(&self, timeout: Duration) -> usize {
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        let timeout_ms = timeout.as_millis() as u64;
        let mut reaped = 0;

        let mut inner = self.lock();
        let PoolInner { groups, draining, .. } = &mut *inner;
        for (task_type, group) in groups.iter_mut() {
            for unit in &group.units {
                let idle_for = now_ms.saturating_sub(unit.state.idle_since_ms());
                if idle_for >= timeout_ms && unit.state.try_terminate_idle() {
                    self.metrics.record_idle_termination();
                    tracing::debug!(task_type = %task_type, unit = unit.id, "Reaped idle worker unit");
                    reaped += 1;
                }
            }
            group.prune(draining);
        }
        inner.forget_finished();
        reaped
    }

    /// Stops accepting work, lets every unit finish its queue, and joins all
    /// unit threads.
    pub fn shutdown(&self) {
        let units: Vec<WorkerUnit> = {
            let mut inner = self.lock();
            inner.shut_down = true;
            let mut units: Vec<WorkerUnit> = inner.draining.drain(..).collect();
            for (_, group) in inner.groups.drain() {
                units.extend(group.units);
            }
            units
        };
        let count = units.len();
        for unit in units {
            unit.join();
        }
        tracing::debug!(units = count, "Worker pool shut down");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        let live: HashMap<&str, usize> = inner
            .groups
            .iter()
            .map(|(k, g)| (k.as_str(), g.units.len()))
            .collect();
        f.debug_struct("WorkerPool")
            .field("config", &self.config)
            .field("live", &live)
            .field("shut_down", &inner.shut_down)
            .finish()
    }
}
