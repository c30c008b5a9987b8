//! Priority-ordered decode scheduling.
//!
//! Decoding is CPU bound, so jobs run on Tokio's blocking pool. A single
//! dispatcher task owns the queue and hands out at most `workers` jobs at a
//! time, highest priority first and FIFO within a priority.
//!
//! ```text
//!  run(priority, job) ──► mpsc ──► dispatcher ──► BinaryHeap
//!                                                    │ pop when a
//!                                                    │ permit frees
//!                                                    ▼
//!  result ◄── oneshot ◄──────────────── spawn_blocking(job)
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::debug;

use crate::error::VolumeError;

/// Default number of concurrent decode jobs.
pub const DEFAULT_WORKERS: usize = 4;

/// Request priority. `High` runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Job {
    priority: Priority,
    task: Task,
}

struct Queued {
    priority: Priority,
    seq: u64,
    task: Task,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    // Max-heap: higher priority first, then lower sequence number
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// =============================================================================
// DecodeScheduler
// =============================================================================

/// Handle to the decode dispatcher. Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct DecodeScheduler {
    tx: mpsc::UnboundedSender<Job>,
    workers: usize,
}

impl DecodeScheduler {
    /// Start a dispatcher on the current Tokio runtime.
    ///
    /// `workers` is clamped to at least one.
    pub fn new(workers: usize) -> Result<Self, VolumeError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| VolumeError::Scheduler(e.to_string()))?;
        let workers = workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(dispatch(rx, Arc::new(Semaphore::new(workers))));
        debug!(workers = workers, "Decode scheduler started");
        Ok(Self { tx, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `f` on the blocking pool and wait for its result.
    ///
    /// # Errors
    ///
    /// [`VolumeError::Scheduler`] when the dispatcher has stopped or `f`
    /// panicked.
    pub async fn run<T, F>(&self, priority: Priority, f: F) -> Result<T, VolumeError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let task: Task = Box::new(move || {
            // Receiver may have gone away; nothing to report then
            let _ = result_tx.send(f());
        });

        self.tx
            .send(Job { priority, task })
            .map_err(|_| VolumeError::Scheduler("dispatcher has stopped".to_string()))?;

        result_rx
            .await
            .map_err(|_| VolumeError::Scheduler("decode job did not complete".to_string()))
    }
}

async fn dispatch(mut rx: mpsc::UnboundedReceiver<Job>, permits: Arc<Semaphore>) {
    let mut queue = BinaryHeap::new();
    let mut seq = 0u64;
    let mut enqueue = |queue: &mut BinaryHeap<Queued>, job: Job| {
        queue.push(Queued {
            priority: job.priority,
            seq,
            task: job.task,
        });
        seq += 1;
    };

    loop {
        if queue.is_empty() {
            match rx.recv().await {
                Some(job) => enqueue(&mut queue, job),
                None => break,
            }
        }

        let permit = match permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        // Jobs sent while waiting for a permit compete on priority
        while let Ok(job) = rx.try_recv() {
            enqueue(&mut queue, job);
        }

        if let Some(next) = queue.pop() {
            tokio::task::spawn_blocking(move || {
                (next.task)();
                drop(permit);
            });
        }
    }

    debug!("Decode scheduler stopped");
}
