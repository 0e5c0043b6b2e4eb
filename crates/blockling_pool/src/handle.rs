use crate::error::{PoolError, Result};
use crate::payload::TaskPayload;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

pub(crate) type Reply = oneshot::Sender<Result<TaskPayload>>;

/// Pending result of a dispatched task. Resolves exactly once, with the
/// task's output or the error that ended it.
///
/// Dropping the handle discards the result; the unit still runs the task to
/// completion.
#[derive(Debug)]
pub struct TaskHandle {
    task_type: String,
    receiver: oneshot::Receiver<Result<TaskPayload>>,
}

impl TaskHandle {
    pub(crate) fn new(task_type: &str) -> (Self, Reply) {
        let (sender, receiver) = oneshot::channel();
        let handle = Self {
            task_type: task_type.to_owned(),
            receiver,
        };
        (handle, sender)
    }

    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Blocks the current thread until the task resolves.
    ///
    /// Inside an async runtime this returns [`PoolError::WaitInRuntime`]
    /// instead of blocking; await the handle there. The task itself still
    /// runs, its result is discarded.
    pub fn wait(self) -> Result<TaskPayload> {
        let task_type = self.task_type;
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(PoolError::WaitInRuntime { task_type });
        }
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(PoolError::WorkerLost { task_type }))
    }
}

impl Future for TaskHandle {
    type Output = Result<TaskPayload>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::WorkerLost {
                task_type: self.task_type.clone(),
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}
