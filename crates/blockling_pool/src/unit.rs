//! A worker unit: one dedicated thread running tasks of a single type, one at
//! a time, fed through its own channel.
//!
//! The unit and the pool share only a small atomic state word:
//!
//! ```text
//! bit 63      TERMINATED  thread has stopped (or is stopping) taking work
//! bit 62      RETIRED     a task failed; no new dispatches, queued jobs are
//!                         answered unrun and the thread exits
//! bits 0..62  in-flight   tasks sent to the unit and not yet answered
//! ```
//!
//! The pool increments in-flight before sending a job and refuses units with
//! either flag set. The unit only terminates for idleness through a
//! compare-and-swap from exactly zero, so a job that is already counted can
//! never be stranded in a dead unit's channel.

use crate::body::TaskBody;
use crate::error::{PoolError, TaskError, TaskFault};
use crate::handle::Reply;
use crate::metrics::PoolMetrics;
use crate::payload::TaskPayload;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const TERMINATED: u64 = 1 << 63;
const RETIRED: u64 = 1 << 62;
const IN_FLIGHT_MASK: u64 = RETIRED - 1;

pub(crate) struct Job {
    pub payload: TaskPayload,
    pub reply: Reply,
}

#[derive(Debug)]
pub(crate) struct UnitState {
    flags: AtomicU64,
    /// Milliseconds since the pool epoch at which the unit last went idle.
    idle_since_ms: AtomicU64,
}

impl UnitState {
    fn new(now_ms: u64) -> Self {
        Self {
            flags: AtomicU64::new(0),
            idle_since_ms: AtomicU64::new(now_ms),
        }
    }

    /// Reserves the unit for one more task. Fails once the unit is retired
    /// or terminated.
    pub fn try_acquire(&self) -> bool {
        self.flags
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |f| {
                if f & (TERMINATED | RETIRED) != 0 {
                    None
                } else {
                    Some(f + 1)
                }
            })
            .is_ok()
    }

    /// Undo a reservation whose job never reached the unit.
    pub fn release(&self) {
        self.flags.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn in_flight(&self) -> u64 {
        self.flags.load(Ordering::Acquire) & IN_FLIGHT_MASK
    }

    /// Accepting new work: neither retired nor terminated.
    pub fn is_available(&self) -> bool {
        self.flags.load(Ordering::Acquire) & (TERMINATED | RETIRED) == 0
    }

    pub fn is_idle(&self) -> bool {
        self.flags.load(Ordering::Acquire) == 0
    }

    pub fn idle_since_ms(&self) -> u64 {
        self.idle_since_ms.load(Ordering::Acquire)
    }

    /// Terminate only if the unit has nothing in flight and no flags set.
    pub fn try_terminate_idle(&self) -> bool {
        self.flags
            .compare_exchange(0, TERMINATED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_retired(&self) -> bool {
        self.flags.load(Ordering::Acquire) & RETIRED != 0
    }

    fn retire(&self) {
        self.flags.fetch_or(RETIRED, Ordering::AcqRel);
    }

    /// Marks one task finished and returns the remaining flags.
    fn finish_one(&self, now_ms: u64) -> u64 {
        let after = self.flags.fetch_sub(1, Ordering::AcqRel) - 1;
        if after & IN_FLIGHT_MASK == 0 {
            self.idle_since_ms.store(now_ms, Ordering::Release);
        }
        after
    }

    fn mark_terminated(&self) {
        self.flags.fetch_or(TERMINATED, Ordering::AcqRel);
    }
}

/// Pool-side handle of a unit.
pub(crate) struct WorkerUnit {
    pub id: u64,
    pub state: Arc<UnitState>,
    sender: mpsc::Sender<Job>,
    thread: Option<JoinHandle<()>>,
}

/// Everything a unit thread needs besides its channel and body.
#[derive(Clone)]
pub(crate) struct UnitContext {
    pub task_type: Arc<str>,
    pub idle_timeout: Duration,
    pub epoch: Instant,
    pub metrics: Arc<PoolMetrics>,
}

impl UnitContext {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

impl WorkerUnit {
    pub fn spawn(id: u64, body: Arc<dyn TaskBody>, ctx: UnitContext) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let state = Arc::new(UnitState::new(ctx.now_ms()));
        let thread_state = Arc::clone(&state);

        let thread = thread::Builder::new()
            .name(format!("blockling-{}-{id}", ctx.task_type))
            .spawn(move || run_unit(id, receiver, body, thread_state, ctx))?;

        Ok(Self {
            id,
            state,
            sender,
            thread: Some(thread),
        })
    }

    /// Hands a job to the unit. The caller must already hold a reservation
    /// from [`UnitState::try_acquire`]. On failure the job is returned.
    pub fn send(&self, job: Job) -> Result<(), Job> {
        self.sender.send(job).map_err(|mpsc::SendError(job)| {
            self.state.release();
            self.state.mark_terminated();
            job
        })
    }

    /// Drops the channel and waits for the thread to drain and exit.
    pub fn join(mut self) {
        let thread = self.thread.take();
        drop(self);
        if let Some(thread) = thread {
            let _ = thread.join();
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

fn run_unit(
    id: u64,
    receiver: mpsc::Receiver<Job>,
    body: Arc<dyn TaskBody>,
    state: Arc<UnitState>,
    ctx: UnitContext,
) {
    tracing::debug!(task_type = %ctx.task_type, unit = id, "Worker unit started");

    loop {
        let job = match receiver.recv_timeout(ctx.idle_timeout) {
            Ok(job) => job,
            Err(RecvTimeoutError::Timeout) => {
                if state.try_terminate_idle() {
                    ctx.metrics.record_idle_termination();
                    tracing::debug!(task_type = %ctx.task_type, unit = id, "Idle worker unit terminated");
                    break;
                }
                continue;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let Job { payload, reply } = job;

        if state.is_retired() {
            // Queued before the failure: hand it back unrun.
            let flags = state.finish_one(ctx.now_ms());
            ctx.metrics.record_rejection();
            let _ = reply.send(Err(PoolError::UnitRetired {
                task_type: ctx.task_type.to_string(),
                unconsumed: Some(Box::new(payload)),
            }));
            if flags & IN_FLIGHT_MASK == 0 {
                break;
            }
            continue;
        }

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body.execute(payload)))
            .unwrap_or_else(|panic| Err(TaskFault::Panicked(panic_message(panic)).into()));

        let result = match outcome {
            Ok(output) => {
                ctx.metrics.record_completion();
                Ok(output)
            }
            Err(TaskError { fault, unconsumed }) => {
                state.retire();
                ctx.metrics.record_failure();
                ctx.metrics.record_retirement();
                tracing::warn!(task_type = %ctx.task_type, unit = id, cause = %fault, "Task failed, retiring worker unit");
                Err(PoolError::TaskExecution {
                    task_type: ctx.task_type.to_string(),
                    cause: fault,
                    unconsumed: unconsumed.map(Box::new),
                })
            }
        };

        // Free the unit before answering so a caller that dispatches again
        // right after the reply finds it idle.
        let flags = state.finish_one(ctx.now_ms());
        let _ = reply.send(result);

        if flags & RETIRED != 0 && flags & IN_FLIGHT_MASK == 0 {
            break;
        }
    }

    state.mark_terminated();
    tracing::debug!(task_type = %ctx.task_type, unit = id, "Worker unit stopped");
}
