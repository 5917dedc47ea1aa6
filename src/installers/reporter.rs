//! # Output sink handed to installers.
//!
//! [`JobReporter`] mirrors each installer line into the job's log and onto
//! the [`EventBus`] as a `stdout` event, in that order, so the log always
//! equals the sequence of published lines.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::events::{Event, EventBus};
use crate::jobs::{JobId, JobStore};

/// Per-job sink for installer output and progress.
pub struct JobReporter {
    job_id: JobId,
    store: Arc<JobStore>,
    bus: Arc<EventBus>,
    last_percent: AtomicU8,
}

impl JobReporter {
    /// Creates a reporter for one job.
    pub fn new(job_id: JobId, store: Arc<JobStore>, bus: Arc<EventBus>) -> Self {
        Self {
            job_id,
            store,
            bus,
            last_percent: AtomicU8::new(0),
        }
    }

    #[inline]
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Appends `line` to the job log, then publishes it as a `stdout` event.
    pub async fn line(&self, line: impl Into<String>) {
        let line = line.into();
        self.store.append_log(&self.job_id, line.clone()).await;
        self.bus.broadcast(&Event::stdout(self.job_id, line)).await;
    }

    /// Publishes a `progress` event; values lower than the last one are dropped.
    pub async fn progress(&self, percent: u8) {
        let percent = percent.min(100);
        let prev = self.last_percent.fetch_max(percent, Ordering::Relaxed);
        if percent < prev {
            tracing::debug!(job_id = %self.job_id, percent, prev, "progress regression dropped");
            return;
        }
        self.bus.broadcast(&Event::progress(self.job_id, percent)).await;
    }
}
