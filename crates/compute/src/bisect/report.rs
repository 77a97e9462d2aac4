//! Human-facing report stream.

use std::sync::Mutex;
use std::time::Duration;

use rowbisect_core::{ProbeOutcome, RowRange};
use tracing::{info, warn};

use crate::progress::ProgressSnapshot;

/// One line of the run's report stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// A range was accepted as work.
    New { range: RowRange },
    /// A worker started probing a range.
    Scanning { range: RowRange },
    /// A probe returned.
    Resolved {
        range: RowRange,
        outcome: ProbeOutcome,
        elapsed: Duration,
    },
    /// A single row failed its probe.
    BrokenRow { row_id: u64 },
    /// Periodic counter snapshot from the monitor.
    Progress(ProgressSnapshot),
}

/// Receives report events from the engine and the monitor.
///
/// Called from many workers at once, so implementations must not block for
/// long.
pub trait ReportSink: Send + Sync {
    fn report(&self, event: &ReportEvent);
}

/// Writes every event as a structured `tracing` event.
pub struct TracingReporter {
    table: String,
    row_id_column: String,
}

impl TracingReporter {
    pub fn new(table: impl Into<String>, row_id_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row_id_column: row_id_column.into(),
        }
    }
}

impl ReportSink for TracingReporter {
    fn report(&self, event: &ReportEvent) {
        match event {
            ReportEvent::New { range } => {
                info!(min = range.start(), max = range.end(), "Range {} - new", range);
            }
            ReportEvent::Scanning { range } => {
                info!(min = range.start(), max = range.end(), "Range {} - scanning", range);
            }
            ReportEvent::Resolved { range, outcome: ProbeOutcome::Ok, elapsed } => {
                info!(
                    min = range.start(),
                    max = range.end(),
                    elapsed_s = elapsed.as_secs_f64(),
                    "Range {} - data is ok",
                    range
                );
            }
            ReportEvent::Resolved { range, outcome: ProbeOutcome::Fault, elapsed } => {
                warn!(
                    min = range.start(),
                    max = range.end(),
                    elapsed_s = elapsed.as_secs_f64(),
                    "Range {} - data is broken",
                    range
                );
            }
            ReportEvent::BrokenRow { row_id } => {
                warn!(
                    table = %self.table,
                    row_id = *row_id,
                    "Discovered broken row, {} = {}",
                    self.row_id_column,
                    row_id
                );
            }
            ReportEvent::Progress(snapshot) => {
                info!(
                    pending = snapshot.pending,
                    finished = snapshot.finished,
                    broken = snapshot.broken,
                    "Task statistics: {}",
                    snapshot
                );
            }
        }
    }
}

/// Keeps every event in memory. Used to inspect a run after the fact.
#[derive(Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Broken row ids in ascending order.
    pub fn broken_rows(&self) -> Vec<u64> {
        let mut rows: Vec<u64> = self
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ReportEvent::BrokenRow { row_id } => Some(row_id),
                _ => None,
            })
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Number of probes that returned, whatever the outcome.
    pub fn probe_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ReportEvent::Resolved { .. }))
            .count()
    }
}

impl ReportSink for CollectingReporter {
    fn report(&self, event: &ReportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
