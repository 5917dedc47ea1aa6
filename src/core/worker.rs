//! # Worker: one consumer loop of the job queue.
//!
//! ## Architecture
//! ```text
//! WorkerPool ──► Worker::run(token)
//!
//! loop {
//!   ├─► dequeue() (cancellable wait)
//!   │     ├─ token cancelled ─► exit, nothing touched
//!   │     └─ job ─► run_job(job, child token)
//!   │                 └─ cancelled mid-job ─► job failed(-1), job_finished published
//!   └─► repeat
//! }
//! ```
//!
//! ## Rules
//! - Jobs run **sequentially** within one worker.
//! - A job is owned by exactly one worker because `dequeue()` pops each id once.
//! - Cancellation is observed at the dequeue wait and inside the installer.
//! - While a job runs its id sits in the shared [`InFlight`] map, keyed by worker id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::{select, sync::Mutex};
use tokio_util::sync::CancellationToken;

use crate::{
    core::runner::run_job,
    events::EventBus,
    installers::InstallerRef,
    jobs::{JobId, JobStore},
};

/// Job currently owned by each worker.
pub(crate) type InFlight = Arc<Mutex<HashMap<usize, JobId>>>;

/// A single long-running queue consumer.
pub struct Worker {
    /// Index within the pool, for logs.
    pub id: usize,
    pub store: Arc<JobStore>,
    pub bus: Arc<EventBus>,
    pub installer: InstallerRef,
    in_flight: InFlight,
}

impl Worker {
    /// Creates a new worker.
    pub fn new(
        id: usize,
        store: Arc<JobStore>,
        bus: Arc<EventBus>,
        installer: InstallerRef,
        in_flight: InFlight,
    ) -> Self {
        Self {
            id,
            store,
            bus,
            installer,
            in_flight,
        }
    }

    /// Pulls and runs jobs until `token` is cancelled or the store is closed.
    pub async fn run(self, token: CancellationToken) {
        tracing::debug!(worker = self.id, "worker started");
        let mut processed: u64 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }
            let job = select! {
                biased;
                _ = token.cancelled() => break,
                job = self.store.dequeue() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            self.in_flight.lock().await.insert(self.id, job.job_id);
            run_job(
                job,
                self.installer.as_ref(),
                &self.store,
                &self.bus,
                &token,
            )
            .await;
            self.in_flight.lock().await.remove(&self.id);
            processed += 1;
        }

        tracing::debug!(worker = self.id, processed, "worker stopped");
    }
}
