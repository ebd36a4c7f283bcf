/// Background task runner
///
/// Side effects that must not sit on a request's critical path (token
/// cleanup, list re-subscription, confirmation email) are handed to this
/// runner instead of being spawned ad hoc. It is an explicit queue plus one
/// worker loop: enqueue is non-blocking, execution is at-least-once with
/// bounded retries, and shutdown drains whatever is still queued before the
/// process exits.
///
/// Task bodies must be idempotent: a retry after partial completion re-runs
/// the whole body (deleting an already-deleted row, re-subscribing an
/// already-subscribed address, all safe no-ops here).

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Attempts per task before giving up
const MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts
const RETRY_DELAY: Duration = Duration::from_millis(200);

/// A queued task: label for logs plus a factory producing a fresh attempt
struct BackgroundTask {
    label: String,
    factory: Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>,
}

/// Handle for enqueueing background tasks
///
/// Cheap to clone; all clones feed the same worker loop.
#[derive(Clone)]
pub struct TaskRunner {
    tx: mpsc::UnboundedSender<BackgroundTask>,
}

impl TaskRunner {
    /// Starts the worker loop and returns the enqueue handle
    ///
    /// The loop runs until `cancel` fires, then drains the queue (one final
    /// attempt per task) and exits. The returned JoinHandle completes when
    /// the drain is done; await it during shutdown.
    pub fn start(cancel: CancellationToken) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(worker_loop(rx, cancel));

        (TaskRunner { tx }, handle)
    }

    /// Enqueues a task
    ///
    /// The factory is invoked once per attempt so retries get a fresh
    /// future. Enqueueing after shutdown logs and drops the task; by then
    /// nothing is waiting on its effects.
    pub fn spawn<F, Fut>(&self, label: &str, factory: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let task = BackgroundTask {
            label: label.to_string(),
            factory: Box::new(move || factory().boxed()),
        };

        if self.tx.send(task).is_err() {
            warn!(label, "Task runner stopped; dropping background task");
        }
    }
}

/// Worker loop: execute until cancelled, then drain
async fn worker_loop(mut rx: mpsc::UnboundedReceiver<BackgroundTask>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            task = rx.recv() => match task {
                Some(task) => run_with_retries(&task).await,
                None => return,
            }
        }
    }

    // Shutdown: one final attempt for everything still queued.
    rx.close();
    let mut drained = 0usize;
    while let Ok(task) = rx.try_recv() {
        drained += 1;
        if let Err(e) = (task.factory)().await {
            error!(label = %task.label, error = %e, "Background task failed during drain");
        }
    }

    if drained > 0 {
        info!(drained, "Drained background tasks on shutdown");
    }
}

/// Runs a task with bounded retries
async fn run_with_retries(task: &BackgroundTask) {
    for attempt in 1..=MAX_ATTEMPTS {
        match (task.factory)().await {
            Ok(()) => {
                debug!(label = %task.label, attempt, "Background task completed");
                return;
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(label = %task.label, attempt, error = %e, "Background task failed; retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
            Err(e) => {
                error!(label = %task.label, attempt, error = %e, "Background task failed; giving up");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_spawned_task_runs() {
        let cancel = CancellationToken::new();
        let (runner, handle) = TaskRunner::start(cancel.clone());

        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        runner.spawn("test-task", move || {
            let done_tx = done_tx.clone();
            async move {
                done_tx.send(()).ok();
                Ok(())
            }
        });

        tokio::time::timeout(Duration::from_secs(1), done_rx.recv())
            .await
            .expect("task did not run")
            .expect("channel closed");

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_task_is_retried() {
        let cancel = CancellationToken::new();
        let (runner, handle) = TaskRunner::start(cancel.clone());

        let attempts = Arc::new(AtomicU32::new(0));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        let counter = attempts.clone();
        runner.spawn("flaky-task", move || {
            let counter = counter.clone();
            let done_tx = done_tx.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt == 1 {
                    anyhow::bail!("transient failure");
                }
                done_tx.send(attempt).ok();
                Ok(())
            }
        });

        let succeeded_on = tokio::time::timeout(Duration::from_secs(2), done_rx.recv())
            .await
            .expect("task never succeeded")
            .expect("channel closed");

        assert_eq!(succeeded_on, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_tasks() {
        let cancel = CancellationToken::new();
        let (runner, handle) = TaskRunner::start(cancel.clone());

        let ran = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            let ran = ran.clone();
            runner.spawn("drained-task", move || {
                let ran = ran.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            });
        }

        // Whether each task runs on the normal path or in the drain, all
        // three must have executed by the time the worker exits.
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }
}
