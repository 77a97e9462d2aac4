/// Worker pool configuration.
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Number of concurrent workers. 0 = available parallelism.
    pub worker_count: usize,
}

impl SchedulerConfig {
    pub fn with_workers(worker_count: usize) -> Self {
        Self { worker_count }
    }

    /// Resolve worker count (0 means use available parallelism).
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_count
        }
    }
}

/// Error type for work submission.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("Scheduler is shut down")]
    Closed,
}
