//! Completion tracking for dispatched batches

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Counts batches that have been enqueued but not yet processed by a worker.
///
/// Incremented immediately before a batch is enqueued and decremented once by the
/// worker that finished it, success or failure. Because the increment happens
/// before the send, the count cannot touch zero while batches are still being fed.
#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    outstanding: AtomicUsize,
    notify: Notify,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one batch about to be enqueued
    pub fn add(&self) {
        self.inner.outstanding.fetch_add(1, Ordering::SeqCst);
    }

    /// Mark one batch as processed
    pub fn done(&self) {
        let previous = self.inner.outstanding.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(previous > 0, "CompletionTracker::done called more times than add");
        if previous == 1 {
            self.inner.notify.notify_waiters();
        }
    }

    /// Mark one batch as processed when the returned guard drops, including
    /// during a panic unwind
    pub fn complete_on_drop(&self) -> CompletionGuard {
        CompletionGuard {
            tracker: self.clone(),
        }
    }

    /// Number of batches still outstanding
    pub fn outstanding(&self) -> usize {
        self.inner.outstanding.load(Ordering::SeqCst)
    }

    /// Wait until every registered batch has been marked done
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register interest before checking so a concurrent `done` is not missed.
            notified.as_mut().enable();

            if self.outstanding() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Calls [`CompletionTracker::done`] exactly once, on drop
#[derive(Debug)]
#[must_use = "dropping the guard marks the batch as processed"]
pub struct CompletionGuard {
    tracker: CompletionTracker,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.tracker.done();
    }
}
