use std::sync::Arc;
use std::time::{Duration, Instant};

use rowbisect_core::{BisectConfig, RowRange};
use tracing::info;

use super::engine::BisectionEngine;
use super::probe::RangeProbe;
use super::report::ReportSink;
use crate::monitor::run_monitor;
use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::scheduler::{SchedulerConfig, TaskScheduler};

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub progress: ProgressSnapshot,
    pub elapsed: Duration,
}

/// Bisect `seed` to single faulty rows and wait for the search to finish.
///
/// Builds a private tracker, worker pool and engine, so concurrent runs in one
/// process do not interfere. Returns once no probe is pending.
pub async fn run_bisection(
    probe: Arc<dyn RangeProbe>,
    reporter: Arc<dyn ReportSink>,
    seed: RowRange,
    config: &BisectConfig,
) -> RunSummary {
    let started = Instant::now();
    let progress = ProgressTracker::new();
    let scheduler = TaskScheduler::start(&SchedulerConfig::with_workers(config.resolved_concurrency()));
    let engine = BisectionEngine::new(probe, Arc::clone(&reporter), progress.clone(), scheduler.handle());

    info!(
        min = seed.start(),
        max = seed.end(),
        workers = scheduler.worker_count(),
        "Bisecting {} ({} rows)",
        seed,
        seed.width()
    );
    engine.submit_range(seed);

    let snapshot = run_monitor(&progress, reporter.as_ref(), config.report_interval()).await;
    drop(engine);
    scheduler.shutdown().await;

    let summary = RunSummary {
        progress: snapshot,
        elapsed: started.elapsed(),
    };
    info!(
        finished = snapshot.finished,
        broken = snapshot.broken,
        elapsed_s = summary.elapsed.as_secs_f64(),
        "All tasks are finished"
    );
    summary
}
