//! # Run a single install job.
//!
//! Drives one dequeued [`InstallJob`] through its state machine, invoking the
//! [`Installer`] and publishing lifecycle events to the [`EventBus`].
//!
//! ## Event flow
//! ```text
//! Success:
//!   update(running) → job_started → [stdout/progress]* → update(finished, 0) → job_finished{true}
//!
//! Nonzero exit:
//!   ... → update(failed, code) → job_finished{false, code}
//!
//! Spawn failure:
//!   ... → update(failed, 127) → job_finished{false, 127}
//!
//! Cancellation (pool shutdown):
//!   installer kills its process → update(failed, -1) → job_finished{false, -1}
//!
//! Loop aborted after the grace period (`abandon_job`):
//!   update(failed, -1) → job_finished{false, -1}
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** `job_started` and **exactly one** `job_finished`.
//! - `job_finished` is published after the record reached its terminal state,
//!   so an observer that reacts to it reads a final record.
//! - The installer gets a **child token** so cancelling it never affects the loop's token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    error::InstallError,
    events::{Event, EventBus},
    installers::{Installer, JobReporter},
    jobs::{InstallJob, JobId, JobStatus, JobStore, JobUpdate},
};

/// Executes `job` to completion (or cancellation) and returns the recorded exit code.
pub async fn run_job(
    job: InstallJob,
    installer: &dyn Installer,
    store: &Arc<JobStore>,
    bus: &Arc<EventBus>,
    parent: &CancellationToken,
) -> i32 {
    let job_id = job.job_id;

    store.update(&job_id, JobUpdate::running()).await;
    publish_started(bus, &job).await;
    tracing::info!(%job_id, package = %job.package, installer = installer.name(), "job started");

    let reporter = JobReporter::new(job_id, Arc::clone(store), Arc::clone(bus));
    let res = installer
        .install(&job.package, &reporter, parent.child_token())
        .await;

    let exit_code = match res {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            match err {
                InstallError::Canceled => {
                    tracing::warn!(%job_id, exit_code = code, "job cancelled by shutdown")
                }
                err => {
                    tracing::error!(%job_id, label = err.as_label(), %err, exit_code = code, "install failed")
                }
            }
            code
        }
    };

    store.update(&job_id, JobUpdate::completed(exit_code)).await;
    publish_finished(bus, job_id, exit_code).await;
    tracing::info!(%job_id, exit_code, success = exit_code == 0, "job finished");

    exit_code
}

/// Finalizes a job whose loop was aborted before `run_job` returned.
///
/// Marks it `failed` with the cancellation sentinel and publishes
/// `job_finished`. Returns `false` (and does nothing) if the job is unknown or
/// already terminal.
pub async fn abandon_job(job_id: JobId, store: &JobStore, bus: &EventBus) -> bool {
    let code = InstallError::CANCELED_EXIT_CODE;
    let Some(job) = store.get(&job_id).await else {
        return false;
    };
    if job.status.is_terminal() {
        return false;
    }
    if job.status == JobStatus::Queued {
        // Popped but never marked running.
        store.update(&job_id, JobUpdate::running()).await;
    }
    store.update(&job_id, JobUpdate::completed(code)).await;
    publish_finished(bus, job_id, code).await;
    tracing::warn!(%job_id, exit_code = code, "job abandoned by aborted worker");
    true
}

/// Publishes `job_started`.
async fn publish_started(bus: &EventBus, job: &InstallJob) {
    bus.broadcast(&Event::job_started(job.job_id, job.package.clone()))
        .await;
}

/// Publishes `job_finished`; success means exit code 0.
async fn publish_finished(bus: &EventBus, job_id: JobId, exit_code: i32) {
    bus.broadcast(&Event::job_finished(job_id, exit_code, exit_code == 0))
        .await;
}
