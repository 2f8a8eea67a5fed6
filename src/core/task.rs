// ─── Background tasks ───
// One way to run long operations off the caller: submit a future, get a
// handle with a cancellation token and a completion channel.

use std::future::Future;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

pub struct TaskHandle<T> {
    name: String,
    cancel: CancellationToken,
    result: oneshot::Receiver<LauncherResult<T>>,
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the task to stop at its next safe point.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the task to finish.
    pub async fn join(self) -> LauncherResult<T> {
        match self.result.await {
            Ok(result) => result,
            Err(_) => Err(LauncherError::Other(format!(
                "task '{}' ended without a result",
                self.name
            ))),
        }
    }

    /// Non-blocking check, for callers polling from an event loop.
    pub fn try_result(&mut self) -> Option<LauncherResult<T>> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(LauncherError::Other(
                format!("task '{}' ended without a result", self.name),
            ))),
        }
    }
}

/// Run `work` on the tokio runtime. `work` receives the task's cancellation
/// token and decides where it is safe to stop.
pub fn spawn_task<T, F, Fut>(name: &str, work: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = LauncherResult<T>> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let (tx, rx) = oneshot::channel();
    let future = work(cancel.clone());
    let task_name = name.to_string();

    tokio::spawn(async move {
        let result = future.await;
        match &result {
            Ok(_) => debug!("Task '{}' finished", task_name),
            Err(e) => warn!("Task '{}' failed: {}", task_name, e),
        }
        let _ = tx.send(result);
    });

    TaskHandle {
        name: name.to_string(),
        cancel,
        result: rx,
    }
}
