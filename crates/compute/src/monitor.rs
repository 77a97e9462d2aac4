//! Progress monitor. Owns the decision that a run is over.

use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::bisect::report::{ReportEvent, ReportSink};
use crate::progress::{ProgressSnapshot, ProgressTracker};

/// Report progress every `interval` until no task is pending.
///
/// Wakes on the interval tick or as soon as `pending` drains, whichever comes
/// first, so the run ends without waiting out a full tick. Every wake emits
/// one [`ReportEvent::Progress`]. Returns the final snapshot.
///
/// Call only after the seed range was submitted; a tracker that never had
/// work reports once and returns at the first tick.
pub async fn run_monitor(
    progress: &ProgressTracker,
    reporter: &dyn ReportSink,
    interval: Duration,
) -> ProgressSnapshot {
    let interval = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = progress.drained() => {}
        }

        let snapshot = progress.snapshot();
        reporter.report(&ReportEvent::Progress(snapshot));
        if snapshot.pending == 0 {
            return snapshot;
        }
    }
}
