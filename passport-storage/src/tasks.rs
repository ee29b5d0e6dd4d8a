//! Detached background work.
//!
//! Cache refills, cache invalidations and event publishes must outlive the
//! request that triggered them. They are spawned onto the runtime with their
//! own lifetime, so dropping the request future never cancels them.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Spawner for fire-and-forget tasks that tracks how many are still running.
#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    inner: Arc<Inner>,
}

struct InFlightGuard {
    inner: Arc<Inner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` detached from the caller.
    ///
    /// Outside a tokio runtime the task is dropped and an error is logged.
    pub fn spawn<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(task = name, error = %e, "No runtime for background task");
                return;
            }
        };

        self.inner.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
        };
        handle.spawn(async move {
            let _guard = guard;
            task.await;
            tracing::trace!(task = name, "Background task finished");
        });
    }

    /// Number of spawned tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Wait until every spawned task has finished.
    pub async fn wait_idle(&self) {
        loop {
            // Register before checking so a completion between the check and
            // the await is not missed.
            let notified = self.inner.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}
