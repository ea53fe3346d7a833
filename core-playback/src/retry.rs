//! Single-shot cancellable retry timer.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// At most one pending deferred task. Dropping the timer cancels it.
pub struct RetryTimer {
    runtime: Handle,
    pending: Arc<Mutex<Option<CancellationToken>>>,
}

impl RetryTimer {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `task` after `delay`.
    ///
    /// Returns `false` and schedules nothing if a task is already pending.
    pub fn arm<F>(&self, delay: Duration, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending.lock();
        if pending.is_some() {
            return false;
        }

        let token = CancellationToken::new();
        *pending = Some(token.clone());
        let slot = Arc::clone(&self.pending);

        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Retry cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    {
                        let mut pending = slot.lock();
                        // cancel() flips the token under this lock
                        if token.is_cancelled() {
                            return;
                        }
                        *pending = None;
                    }
                    task.await;
                }
            }
        });

        true
    }

    /// Cancel the pending task. Returns `true` if one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for RetryTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryTimer")
            .field("pending", &self.is_pending())
            .finish()
    }
}
