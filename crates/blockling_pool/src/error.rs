//! Error types for blockling_pool.
//!
//! Synchronous dispatch problems (unknown task type, pool shut down, thread
//! spawn failure) come back from `dispatch` itself. Everything that happens
//! inside a unit is reported through the task's handle.

use crate::payload::TaskPayload;
use blockling_core::CoreError;
use thiserror::Error;

/// Why a task body could not produce a result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskFault {
    /// The payload was the wrong kind or could not be decoded.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The body panicked.
    #[error("task panicked: {0}")]
    Panicked(String),

    /// The body ran but the core computation rejected its input.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// What a body reports when it fails: the fault, plus the input payload when
/// the body gave up before consuming it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskError {
    pub fault: TaskFault,
    pub unconsumed: Option<TaskPayload>,
}

impl TaskError {
    /// A failure that hands `payload` back untouched.
    pub fn returning(fault: impl Into<TaskFault>, payload: TaskPayload) -> Self {
        Self {
            fault: fault.into(),
            unconsumed: Some(payload),
        }
    }
}

impl From<TaskFault> for TaskError {
    fn from(fault: TaskFault) -> Self {
        Self {
            fault,
            unconsumed: None,
        }
    }
}

impl From<CoreError> for TaskError {
    fn from(err: CoreError) -> Self {
        TaskFault::from(err).into()
    }
}

#[derive(Error, Debug)]
pub enum PoolError {
    /// The task failed inside its unit; the unit has been retired.
    #[error("task '{task_type}' failed: {cause}")]
    TaskExecution {
        task_type: String,
        cause: TaskFault,
        /// Input payload, when the body did not consume it.
        unconsumed: Option<Box<TaskPayload>>,
    },

    /// The task was queued on a unit that was retired before reaching it. It
    /// never ran; the payload comes back as sent.
    #[error("worker unit for '{task_type}' was retired before running the task")]
    UnitRetired {
        task_type: String,
        unconsumed: Option<Box<TaskPayload>>,
    },

    /// [`TaskHandle::wait`](crate::TaskHandle::wait) was called on a thread
    /// driving an async runtime.
    #[error("blocking wait on '{task_type}' inside an async runtime; await the handle instead")]
    WaitInRuntime { task_type: String },

    #[error("no task body registered for '{0}'")]
    UnknownTaskType(String),

    /// The unit went away without answering.
    #[error("worker unit for '{task_type}' exited before replying")]
    WorkerLost { task_type: String },

    /// A result arrived but was not the payload kind the caller expected.
    #[error("expected {expected} payload, got {found}")]
    UnexpectedPayload {
        expected: &'static str,
        found: &'static str,
    },

    #[error("failed to spawn worker unit: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("worker pool has been shut down")]
    ShutDown,
}

pub type Result<T> = std::result::Result<T, PoolError>;

impl PoolError {
    /// The fault behind a failed task, if this is an execution error.
    pub fn fault(&self) -> Option<&TaskFault> {
        match self {
            Self::TaskExecution { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Takes back the payload of a task that never consumed it.
    pub fn into_payload(mut self) -> Option<TaskPayload> {
        self.take_payload()
    }

    /// Like [`into_payload`](Self::into_payload), but leaves the error in
    /// place so it can still be reported.
    pub fn take_payload(&mut self) -> Option<TaskPayload> {
        match self {
            Self::TaskExecution { unconsumed, .. } | Self::UnitRetired { unconsumed, .. } => {
                unconsumed.take().map(|p| *p)
            }
            _ => None,
        }
    }
}
