//! # In-memory job store: record table + FIFO of job ids.
//!
//! [`JobStore`] exclusively owns every [`InstallJob`] and the work queue.
//! Producers call [`JobStore::enqueue`]; worker loops block in
//! [`JobStore::dequeue`] until an id is available.
//!
//! ## Architecture
//! ```text
//! POST /enqueue ──► enqueue() ──► jobs[id] = queued record
//!                              └► queue.push_back(id) ──► notify_one()
//!
//! worker loop ──► dequeue() ──► queue.pop_front() ──► clone of jobs[id]
//!                    └─ empty: park on Notify until enqueue()/close()
//! ```
//!
//! ## Rules
//! - **Single lock domain**: table and FIFO live behind one mutex, so `list()` never
//!   observes a half-applied update.
//! - **Cancel-safe dequeue**: the pop and the return happen in the same poll,
//!   so dropping a pending `dequeue()` never loses a job id.
//! - **Unknown ids are ignored** by `update` / `append_log` (reported as `false`).

use std::collections::VecDeque;

use indexmap::IndexMap;
use tokio::sync::{Mutex, Notify};

use super::job::{InstallJob, JobId, JobUpdate};

#[derive(Default)]
struct Inner {
    jobs: IndexMap<JobId, InstallJob>,
    queue: VecDeque<JobId>,
    closed: bool,
}

/// Job record table and FIFO under a single mutual-exclusion domain.
#[derive(Default)]
pub struct JobStore {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl JobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queued job for `package`, records it and appends its id to the FIFO.
    ///
    /// Validation of the package name is the caller's responsibility.
    pub async fn enqueue(&self, package: impl Into<String>) -> InstallJob {
        let job = InstallJob::new(package);
        {
            let mut inner = self.inner.lock().await;
            inner.jobs.insert(job.job_id, job.clone());
            inner.queue.push_back(job.job_id);
        }
        self.notify.notify_one();
        tracing::debug!(job_id = %job.job_id, package = %job.package, "job enqueued");
        job
    }

    /// Waits until the FIFO is non-empty, pops the head id and returns its record.
    ///
    /// Returns `None` only after [`close`](Self::close).
    pub async fn dequeue(&self) -> Option<InstallJob> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking the queue so an enqueue in between is not missed.
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock().await;
                while let Some(id) = inner.queue.pop_front() {
                    if let Some(job) = inner.jobs.get(&id) {
                        return Some(job.clone());
                    }
                }
                if inner.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Point lookup.
    pub async fn get(&self, job_id: &JobId) -> Option<InstallJob> {
        self.inner.lock().await.jobs.get(job_id).cloned()
    }

    /// Consistent snapshot of every job, in insertion order.
    pub async fn list(&self) -> Vec<InstallJob> {
        self.inner.lock().await.jobs.values().cloned().collect()
    }

    /// Atomically applies a partial update to one job.
    ///
    /// Returns `false` if the job id is unknown. Backward status moves and
    /// rewrites of write-once fields are dropped and logged.
    pub async fn update(&self, job_id: &JobId, update: JobUpdate) -> bool {
        let mut inner = self.inner.lock().await;
        let Some(job) = inner.jobs.get_mut(job_id) else {
            tracing::debug!(%job_id, "update for unknown job ignored");
            return false;
        };
        let rejected = job.apply(update);
        if !rejected.is_empty() {
            tracing::warn!(%job_id, status = %job.status, ?rejected, "job update partially rejected");
        }
        true
    }

    /// Atomically appends one output line to a job's log.
    ///
    /// Returns `false` if the job id is unknown.
    pub async fn append_log(&self, job_id: &JobId, line: impl Into<String>) -> bool {
        match self.inner.lock().await.jobs.get_mut(job_id) {
            Some(job) => {
                job.log.push(line.into());
                true
            }
            None => false,
        }
    }

    /// Number of job records.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.jobs.len()
    }

    /// Returns true if no job was ever enqueued.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.jobs.is_empty()
    }

    /// Number of ids waiting in the FIFO.
    pub async fn queued_len(&self) -> usize {
        self.inner.lock().await.queue.len()
    }

    /// Wakes every blocked `dequeue()`; once the FIFO drains they return `None`.
    pub async fn close(&self) {
        self.inner.lock().await.closed = true;
        self.notify.notify_waiters();
    }
}
