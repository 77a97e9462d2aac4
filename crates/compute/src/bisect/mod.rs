//! Fault localisation by range bisection.
//!
//! - `engine`: the split-on-fault algorithm
//! - `probe`: the range probe seam implemented by storage backends
//! - `report`: the report stream and its sinks
//! - `run`: wires engine, scheduler and monitor into one run

pub mod engine;
pub mod probe;
pub mod report;
pub mod run;
#[cfg(test)]
mod tests;

pub use engine::BisectionEngine;
pub use probe::RangeProbe;
pub use report::{CollectingReporter, ReportEvent, ReportSink, TracingReporter};
pub use run::{run_bisection, RunSummary};
