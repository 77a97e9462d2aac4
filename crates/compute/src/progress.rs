//! Lock-free run counters.
//!
//! `pending`, `finished` and `broken` are the only state shared between
//! concurrently running probes. They are only ever changed with single atomic
//! increments/decrements, never a load followed by a store.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Notify;

/// Cloneable handle to one run's counters.
///
/// Each run owns its own tracker, so independent runs can share a process.
#[derive(Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    pending: AtomicU64,
    finished: AtomicU64,
    broken: AtomicU64,
    /// Fired when `pending` drops to zero.
    drained: Notify,
}

/// Point-in-time view of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProgressSnapshot {
    pub pending: u64,
    pub finished: u64,
    pub broken: u64,
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pending tasks, {} finished tasks, {} broken rows",
            self.pending, self.finished, self.broken
        )
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A range was accepted as work.
    pub fn task_submitted(&self) {
        self.inner.pending.fetch_add(1, Ordering::SeqCst);
    }

    /// A probe completed, whatever its outcome.
    pub fn task_finished(&self) {
        self.inner.finished.fetch_add(1, Ordering::SeqCst);
        self.release_pending();
    }

    /// A submitted task will never run (its scheduler is gone).
    pub fn task_abandoned(&self) {
        self.release_pending();
    }

    /// A singleton range failed its probe.
    pub fn row_broken(&self) {
        self.inner.broken.fetch_add(1, Ordering::SeqCst);
    }

    fn release_pending(&self) {
        let before = self.inner.pending.fetch_sub(1, Ordering::SeqCst);
        debug_assert!(before > 0, "pending counter underflow");
        if before == 1 {
            self.inner.drained.notify_one();
        }
    }

    pub fn pending(&self) -> u64 {
        self.inner.pending.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> u64 {
        self.inner.finished.load(Ordering::SeqCst)
    }

    pub fn broken(&self) -> u64 {
        self.inner.broken.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            pending: self.pending(),
            finished: self.finished(),
            broken: self.broken(),
        }
    }

    /// Resolves after `pending` has dropped to zero at least once.
    ///
    /// A drain that happened before the call is not lost: the notification
    /// is stored until someone waits for it.
    pub async fn drained(&self) {
        self.inner.drained.notified().await;
    }
}
