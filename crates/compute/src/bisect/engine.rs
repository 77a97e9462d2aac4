use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use rowbisect_core::{ProbeError, ProbeOutcome, RowRange};
use tracing::{debug, error, warn};

use super::probe::RangeProbe;
use super::report::{ReportEvent, ReportSink};
use crate::progress::ProgressTracker;
use crate::scheduler::SchedulerHandle;

/// Divide-and-conquer search for faulty rows.
///
/// Every accepted range becomes one probe on the scheduler. A range that
/// probes clean is done. A faulty range is either a confirmed broken row
/// (width 1) or is retired and replaced by its two halves, which are queued
/// before the parent's task completes. The same range is never probed twice.
#[derive(Clone)]
pub struct BisectionEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    probe: Arc<dyn RangeProbe>,
    reporter: Arc<dyn ReportSink>,
    progress: ProgressTracker,
    scheduler: SchedulerHandle,
}

impl BisectionEngine {
    pub fn new(
        probe: Arc<dyn RangeProbe>,
        reporter: Arc<dyn ReportSink>,
        progress: ProgressTracker,
        scheduler: SchedulerHandle,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                probe,
                reporter,
                progress,
                scheduler,
            }),
        }
    }

    /// Queue a probe of `[min, max)`.
    ///
    /// Empty or inverted bounds are ignored: nothing is queued and no counter
    /// moves. Returns whether a task was queued.
    pub fn submit(&self, min: u64, max: u64) -> bool {
        match RowRange::new(min, max) {
            Some(range) => self.submit_range(range),
            None => false,
        }
    }

    /// Queue a probe of `range`. Returns whether a task was queued.
    pub fn submit_range(&self, range: RowRange) -> bool {
        let inner = &self.inner;
        inner.progress.task_submitted();
        inner.reporter.report(&ReportEvent::New { range });

        let engine = self.clone();
        match inner.scheduler.submit(async move { engine.probe_and_react(range).await }) {
            Ok(()) => true,
            Err(e) => {
                error!(min = range.start(), max = range.end(), "Range {} dropped: {}", range, e);
                inner.progress.task_abandoned();
                false
            }
        }
    }

    async fn probe_and_react(&self, range: RowRange) {
        let inner = &self.inner;
        inner.reporter.report(&ReportEvent::Scanning { range });

        let started = Instant::now();
        // A panicking probe must still complete its task or `pending` never drains.
        let result = match AssertUnwindSafe(inner.probe.probe(range)).catch_unwind().await {
            Ok(result) => result,
            Err(_) => {
                warn!(min = range.start(), max = range.end(), "Probe of {} panicked", range);
                Err(ProbeError::Panicked)
            }
        };
        let elapsed = started.elapsed();

        if let Err(e) = &result {
            debug!(min = range.start(), max = range.end(), "Probe of {} failed: {}", range, e);
        }
        let outcome = ProbeOutcome::from(result);
        inner.reporter.report(&ReportEvent::Resolved { range, outcome, elapsed });

        if outcome.is_fault() {
            match range.split() {
                None => {
                    inner.progress.row_broken();
                    inner.reporter.report(&ReportEvent::BrokenRow { row_id: range.start() });
                }
                Some((lower, upper)) => {
                    self.submit_range(lower);
                    self.submit_range(upper);
                }
            }
        }

        inner.progress.task_finished();
    }
}
