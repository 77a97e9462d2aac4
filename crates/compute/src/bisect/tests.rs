use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rowbisect_core::{ProbeError, ProbeOutcome, RowRange};
use tokio::time::timeout;

use crate::bisect::{BisectionEngine, CollectingReporter, RangeProbe, ReportEvent};
use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::scheduler::{SchedulerConfig, TaskScheduler};

const TIMEOUT: Duration = Duration::from_secs(10);

/// Fails any range containing one of `broken`; remembers every range probed.
struct FaultyRows {
    broken: BTreeSet<u64>,
    probed: Mutex<Vec<RowRange>>,
    calls: AtomicUsize,
}

impl FaultyRows {
    fn new(broken: impl IntoIterator<Item = u64>) -> Self {
        Self {
            broken: broken.into_iter().collect(),
            probed: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn probed(&self) -> Vec<RowRange> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RangeProbe for FaultyRows {
    async fn probe(&self, range: RowRange) -> Result<(), ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.probed.lock().unwrap().push(range);
        tokio::task::yield_now().await;
        match self.broken.range(range.start()..range.end()).next() {
            // Alternate the error kind; the engine must not care.
            Some(row) if row % 2 == 0 => Err(ProbeError::EmptyResult),
            Some(row) => Err(ProbeError::Query(format!("corrupted row {}", row))),
            None => Ok(()),
        }
    }
}

struct Harness {
    scheduler: TaskScheduler,
    engine: BisectionEngine,
    progress: ProgressTracker,
    reporter: Arc<CollectingReporter>,
    probe: Arc<FaultyRows>,
}

impl Harness {
    fn new(workers: usize, broken: impl IntoIterator<Item = u64>) -> Self {
        let scheduler = TaskScheduler::start(&SchedulerConfig::with_workers(workers));
        let progress = ProgressTracker::new();
        let reporter = Arc::new(CollectingReporter::new());
        let probe = Arc::new(FaultyRows::new(broken));
        let engine = BisectionEngine::new(
            probe.clone(),
            reporter.clone(),
            progress.clone(),
            scheduler.handle(),
        );
        Self { scheduler, engine, progress, reporter, probe }
    }

    async fn wait(&self) -> ProgressSnapshot {
        timeout(TIMEOUT, self.progress.drained()).await.unwrap();
        self.progress.snapshot()
    }
}

/// Report events with timing stripped, for exact comparisons.
fn shape(events: &[ReportEvent]) -> Vec<String> {
    events
        .iter()
        .map(|e| match e {
            ReportEvent::New { range } => format!("new {}", range),
            ReportEvent::Scanning { range } => format!("scan {}", range),
            ReportEvent::Resolved { range, outcome, .. } => format!("{} {}", outcome, range),
            ReportEvent::BrokenRow { row_id } => format!("row {}", row_id),
            ReportEvent::Progress(s) => format!("progress {}", s),
        })
        .collect()
}

#[tokio::test]
async fn empty_and_inverted_submissions_are_ignored() {
    let h = Harness::new(2, [1]);

    assert!(!h.engine.submit(5, 5));
    assert!(!h.engine.submit(9, 3));
    assert!(!h.engine.submit(0, 0));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.progress.snapshot(), ProgressSnapshot::default());
    assert!(h.reporter.events().is_empty());
    assert_eq!(h.probe.calls.load(Ordering::SeqCst), 0);

    h.scheduler.shutdown().await;
}

#[tokio::test]
async fn clean_range_is_probed_once() {
    let h = Harness::new(2, []);

    assert!(h.engine.submit(0, 1_000));
    let snapshot = h.wait().await;

    assert_eq!(snapshot, ProgressSnapshot { pending: 0, finished: 1, broken: 0 });
    assert_eq!(h.probe.probed(), vec![RowRange::new(0, 1_000).unwrap()]);
    assert_eq!(
        shape(&h.reporter.events()),
        vec!["new [0, 1000)", "scan [0, 1000)", "ok [0, 1000)"]
    );

    h.scheduler.shutdown().await;
}

#[tokio::test]
async fn faulty_singleton_is_a_finding() {
    let h = Harness::new(1, [7]);

    assert!(h.engine.submit(7, 8));
    let snapshot = h.wait().await;

    assert_eq!(snapshot, ProgressSnapshot { pending: 0, finished: 1, broken: 1 });
    assert_eq!(
        shape(&h.reporter.events()),
        vec!["new [7, 8)", "scan [7, 8)", "broken [7, 8)", "row 7"]
    );

    h.scheduler.shutdown().await;
}

#[tokio::test]
async fn children_are_queued_only_after_parent_fails() {
    let h = Harness::new(1, [1]);

    h.engine.submit(0, 2);
    h.wait().await;

    assert_eq!(
        shape(&h.reporter.events()),
        vec![
            "new [0, 2)",
            "scan [0, 2)",
            "broken [0, 2)",
            "new [0, 1)",
            "new [1, 2)",
            "scan [0, 1)",
            "ok [0, 1)",
            "scan [1, 2)",
            "broken [1, 2)",
            "row 1",
        ]
    );

    h.scheduler.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn no_range_is_probed_twice() {
    let h = Harness::new(8, [0, 3, 17, 18, 63]);

    h.engine.submit(0, 64);
    let snapshot = h.wait().await;

    let probed = h.probe.probed();
    let unique: BTreeSet<_> = probed.iter().copied().collect();
    assert_eq!(unique.len(), probed.len());
    assert_eq!(snapshot.finished as usize, probed.len());
    assert_eq!(snapshot.broken, 5);
    assert_eq!(h.reporter.broken_rows(), vec![0, 3, 17, 18, 63]);

    h.scheduler.shutdown().await;
}

#[tokio::test]
async fn every_resolved_fault_is_either_split_or_a_finding() {
    let h = Harness::new(3, [10, 11, 12]);

    h.engine.submit(0, 16);
    h.wait().await;

    let events = h.reporter.events();
    let faulty: Vec<RowRange> = events
        .iter()
        .filter_map(|e| match e {
            ReportEvent::Resolved { range, outcome: ProbeOutcome::Fault, .. } => Some(*range),
            _ => None,
        })
        .collect();
    let submitted: BTreeSet<RowRange> = events
        .iter()
        .filter_map(|e| match e {
            ReportEvent::New { range } => Some(*range),
            _ => None,
        })
        .collect();

    for range in faulty {
        match range.split() {
            Some((lo, hi)) => {
                assert!(submitted.contains(&lo) && submitted.contains(&hi), "{} not split", range);
            }
            None => assert!(events.contains(&ReportEvent::BrokenRow { row_id: range.start() })),
        }
    }

    h.scheduler.shutdown().await;
}

#[tokio::test]
async fn submission_to_stopped_scheduler_rolls_back_pending() {
    let h = Harness::new(1, []);
    let handle = h.scheduler.handle();
    h.scheduler.shutdown().await;

    assert!(!h.engine.submit(0, 10));
    assert_eq!(h.progress.pending(), 0);
    assert_eq!(h.progress.finished(), 0);
    assert!(handle.submit(async {}).is_err());
}

struct AlwaysPanics;

#[async_trait]
impl RangeProbe for AlwaysPanics {
    async fn probe(&self, range: RowRange) -> Result<(), ProbeError> {
        panic!("lost connection while reading {}", range);
    }
}

#[tokio::test]
async fn panicking_singleton_still_completes_as_a_finding() {
    let scheduler = TaskScheduler::start(&SchedulerConfig::with_workers(1));
    let progress = ProgressTracker::new();
    let reporter = Arc::new(CollectingReporter::new());
    let engine = BisectionEngine::new(
        Arc::new(AlwaysPanics),
        reporter.clone(),
        progress.clone(),
        scheduler.handle(),
    );

    assert!(engine.submit(4, 5));
    timeout(TIMEOUT, progress.drained()).await.unwrap();

    assert_eq!(progress.snapshot(), ProgressSnapshot { pending: 0, finished: 1, broken: 1 });
    assert_eq!(
        shape(&reporter.events()),
        vec!["new [4, 5)", "scan [4, 5)", "broken [4, 5)", "row 4"]
    );

    scheduler.shutdown().await;
}
