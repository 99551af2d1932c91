use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures_util::FutureExt;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::task::TaskTracker;

/// A background unit that ended in an error or panic.
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub label: String,
    pub error: String,
}

/// Runs background units with bounded concurrency.
///
/// Units are spawned immediately and wait for a permit before running, so
/// the caller never blocks. Errors and panics go to the failure channel
/// instead of being dropped with the task.
#[derive(Clone)]
pub struct TaskRunner {
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    failures: mpsc::UnboundedSender<TaskFailure>,
}

impl TaskRunner {
    /// Creates a runner and the receiving end of its failure channel.
    pub fn new(max_concurrent: usize) -> (Self, mpsc::UnboundedReceiver<TaskFailure>) {
        let (failures, receiver) = mpsc::unbounded_channel();
        let runner = Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            tracker: TaskTracker::new(),
            failures,
        };
        (runner, receiver)
    }

    /// Creates a runner whose failures are logged by a supervisor task.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn supervised(max_concurrent: usize) -> Self {
        let (runner, receiver) = Self::new(max_concurrent);
        tokio::spawn(supervise(receiver));
        runner
    }

    pub fn spawn<F>(&self, label: impl Into<String>, unit: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let label = label.into();
        let permits = Arc::clone(&self.permits);
        let failures = self.failures.clone();
        self.tracker.spawn(async move {
            // Closed only if the runner is dropped mid-flight; run anyway.
            let _permit = permits.acquire_owned().await.ok();
            let error = match AssertUnwindSafe(unit).catch_unwind().await {
                Ok(Ok(())) => return,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
            };
            let _ = failures.send(TaskFailure { label, error });
        });
    }

    /// Number of units spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every unit spawned so far has finished.
    ///
    /// The runner keeps accepting new units afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stops accepting new units and waits for in-flight ones.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn supervise(mut receiver: mpsc::UnboundedReceiver<TaskFailure>) {
    while let Some(failure) = receiver.recv().await {
        tracing::error!(task = %failure.label, error = %failure.error, "Background task failed");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
