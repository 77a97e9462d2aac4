pub mod bisect;
pub mod monitor;
pub mod progress;
pub mod scheduler;

pub use bisect::{
    run_bisection, BisectionEngine, CollectingReporter, RangeProbe, ReportEvent, ReportSink,
    RunSummary, TracingReporter,
};
pub use monitor::run_monitor;
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use scheduler::{SchedulerConfig, SchedulerError, SchedulerHandle, TaskScheduler};
