//! # WorkerPool: N queue consumers with graceful shutdown.
//!
//! ## High-level architecture
//! ```text
//! start():
//!   for i in 0..workers:
//!     Worker::new(i, store, bus, installer, in_flight)
//!        └──► set.spawn(worker.run(runtime_token.child_token()))
//!
//! stop():
//!   runtime_token.cancel()   → propagates to every worker and running installer
//!   wait_all_with_grace(grace):
//!      ├─ Ok (all joined)    → every in-flight job already finalized as failed(-1)
//!      └─ Timeout exceeded   → abort remaining loops, finalize their jobs as failed(-1),
//!                              RuntimeError::GraceExceeded
//! ```
//!
//! There is no partitioning: every worker pops from the same FIFO, so with
//! more than one worker jobs may finish out of submission order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::{sync::Mutex, task::JoinSet};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        runner,
        worker::{InFlight, Worker},
    },
    error::RuntimeError,
    events::EventBus,
    installers::InstallerRef,
    jobs::JobStore,
};

/// Fixed-size set of worker loops sharing one job store.
pub struct WorkerPool {
    workers: usize,
    grace: Duration,
    store: Arc<JobStore>,
    bus: Arc<EventBus>,
    installer: InstallerRef,
    runtime_token: CancellationToken,
    set: Mutex<JoinSet<()>>,
    in_flight: InFlight,
}

impl WorkerPool {
    /// Creates a pool of `workers` loops (minimum 1). Nothing runs until [`start`](Self::start).
    pub fn new(
        workers: usize,
        grace: Duration,
        store: Arc<JobStore>,
        bus: Arc<EventBus>,
        installer: InstallerRef,
    ) -> Self {
        Self {
            workers: workers.max(1),
            grace,
            store,
            bus,
            installer,
            runtime_token: CancellationToken::new(),
            set: Mutex::new(JoinSet::new()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of worker loops.
    #[inline]
    pub fn size(&self) -> usize {
        self.workers
    }

    /// Spawns the worker loops. Calling it again while they run is a no-op.
    pub async fn start(&self) {
        let mut set = self.set.lock().await;
        if !set.is_empty() || self.runtime_token.is_cancelled() {
            return;
        }
        for id in 0..self.workers {
            let worker = Worker::new(
                id,
                Arc::clone(&self.store),
                Arc::clone(&self.bus),
                Arc::clone(&self.installer),
                Arc::clone(&self.in_flight),
            );
            set.spawn(worker.run(self.runtime_token.child_token()));
        }
        tracing::info!(workers = self.workers, installer = self.installer.name(), "worker pool started");
    }

    /// Cancels every loop and waits up to the grace period for them to finalize.
    ///
    /// Loops waiting on the queue exit immediately; loops mid-job kill the
    /// installer, mark the job `failed` and publish `job_finished` first.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        self.runtime_token.cancel();
        let mut set = std::mem::take(&mut *self.set.lock().await);
        self.wait_all_with_grace(&mut set).await
    }

    /// Returns true once [`stop`](Self::stop) was called.
    #[inline]
    pub fn is_stopping(&self) -> bool {
        self.runtime_token.is_cancelled()
    }

    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.grace;
        let done = async {
            while let Some(res) = set.join_next().await {
                if let Err(err) = res {
                    tracing::error!(%err, "worker loop terminated abnormally");
                }
            }
        };

        let res = tokio::time::timeout(grace, done).await;
        match res {
            Ok(()) => {
                tracing::info!("worker pool stopped");
                Ok(())
            }
            Err(_) => {
                let stuck = set.len();
                set.abort_all();
                while set.join_next().await.is_some() {}
                tracing::error!(?grace, stuck, "worker pool grace exceeded");

                let abandoned: Vec<_> = self.in_flight.lock().await.drain().map(|(_, id)| id).collect();
                for job_id in abandoned {
                    runner::abandon_job(job_id, &self.store, &self.bus).await;
                }
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }
}
