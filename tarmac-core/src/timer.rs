//! Deferred single-shot callbacks driven by the tokio timer wheel.
//!
//! A `DeferredTask` is owned by whatever needs "do X after D": a lease owns
//! one for its expiration, a runway owns one while an operation is running.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A callback armed to run once after a delay.
///
/// Cancelling is best-effort: once the delay has elapsed and the callback
/// has started, `cancel` has no effect. Callers that race a cancel against
/// the callback must settle the race themselves.
#[derive(Debug)]
pub struct DeferredTask {
    handle: JoinHandle<()>,
}

impl DeferredTask {
    /// Arms `callback` to run on `runtime` after `delay`.
    pub fn schedule<F>(runtime: &Handle, delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        Self { handle }
    }

    /// Stops the callback from firing if it has not started yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// True once the callback ran to completion or the task was cancelled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
