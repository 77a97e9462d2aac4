use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::{SchedulerConfig, SchedulerError};

type Job = BoxFuture<'static, ()>;
type SharedQueue = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Fixed-size pool of tokio workers sharing one unbounded FIFO queue.
///
/// The pool is sized once at [`start`](TaskScheduler::start) and never
/// resized. Work is submitted through a [`SchedulerHandle`], which may be
/// cloned into the work itself.
pub struct TaskScheduler {
    handle: SchedulerHandle,
    stop: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

/// Cloneable submission side of a [`TaskScheduler`].
#[derive(Clone)]
pub struct SchedulerHandle {
    queue: mpsc::UnboundedSender<Job>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskScheduler {
    /// Spawn the workers. Must be called from within a tokio runtime.
    pub fn start(config: &SchedulerConfig) -> Self {
        let worker_count = config.resolved_worker_count();
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let queue: SharedQueue = Arc::new(Mutex::new(rx));
        let (stop, stop_rx) = watch::channel(false);
        let in_flight = Arc::new(AtomicUsize::new(0));

        let workers = (0..worker_count)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&queue),
                    stop_rx.clone(),
                    Arc::clone(&in_flight),
                ))
            })
            .collect();

        info!(workers = worker_count, "Task scheduler started");

        Self {
            handle: SchedulerHandle { queue: tx, in_flight },
            stop,
            workers,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop the workers and wait for them to exit.
    ///
    /// Units already running finish first; units still queued are dropped.
    /// Once every worker is gone further submits fail with
    /// [`SchedulerError::Closed`].
    pub async fn shutdown(self) {
        self.stop.send_replace(true);
        for worker in self.workers {
            if let Err(e) = worker.await {
                warn!("Worker did not exit cleanly: {}", e);
            }
        }
        info!("Task scheduler stopped");
    }
}

impl SchedulerHandle {
    /// Enqueue a unit of work. Never waits for a free worker.
    pub fn submit<F>(&self, work: F) -> Result<(), SchedulerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.queue
            .send(work.boxed())
            .map_err(|_| SchedulerError::Closed)
    }

    /// Units currently executing on a worker.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

async fn worker_loop(
    id: usize,
    queue: SharedQueue,
    mut stop: watch::Receiver<bool>,
    in_flight: Arc<AtomicUsize>,
) {
    loop {
        // Only one idle worker waits on the queue at a time; the rest wait
        // on the lock. Either way a stop signal wakes them.
        let job = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = stop.changed() => None,
                job = rx.recv() => job,
            }
        };
        let Some(job) = job else { break };

        in_flight.fetch_add(1, Ordering::SeqCst);
        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
            error!(worker = id, "Work unit panicked");
        }
        in_flight.fetch_sub(1, Ordering::SeqCst);
    }
    debug!(worker = id, "Worker stopped");
}
