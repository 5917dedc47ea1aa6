//! # Install job record and its state machine.
//!
//! ```text
//! queued ──► running ──► finished   (exit code 0)
//!                   └──► failed     (nonzero exit, spawn failure, cancellation)
//! ```
//!
//! ## Rules
//! - `status` only moves forward; [`JobStatus::can_advance_to`] is the single gate.
//! - `started_at`, `finished_at` and `exit_code` are write-once.
//! - `log` is append-only.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, process-unique job identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Lifecycle state of an [`InstallJob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting in the FIFO.
    Queued,
    /// Picked up by a worker loop.
    Running,
    /// Installer exited with code 0.
    Finished,
    /// Installer failed, exited nonzero, or was cancelled.
    Failed,
}

impl JobStatus {
    /// Returns true for `finished` and `failed`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed)
    }

    /// Returns true if `self → next` is a legal forward transition.
    pub fn can_advance_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Finished)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One package-install request and its execution record.
///
/// Timestamps are seconds since the Unix epoch as `f64`, matching the event wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallJob {
    pub job_id: JobId,
    pub package: String,
    pub status: JobStatus,
    pub created_at: f64,
    pub started_at: Option<f64>,
    pub finished_at: Option<f64>,
    pub exit_code: Option<i32>,
    pub log: Vec<String>,
}

impl InstallJob {
    /// Creates a queued job with a fresh id.
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            job_id: JobId::new(),
            package: package.into(),
            status: JobStatus::Queued,
            created_at: unix_now(),
            started_at: None,
            finished_at: None,
            exit_code: None,
            log: Vec::new(),
        }
    }

    /// Applies a partial update, honoring forward-only status and write-once fields.
    ///
    /// Returns the fields that were rejected, if any, so the caller can log them.
    pub(crate) fn apply(&mut self, update: JobUpdate) -> Vec<&'static str> {
        let mut rejected = Vec::new();

        if let Some(next) = update.status {
            if self.status.can_advance_to(next) {
                self.status = next;
            } else if self.status != next {
                rejected.push("status");
            }
        }
        set_once(&mut self.started_at, update.started_at, "started_at", &mut rejected);
        set_once(&mut self.finished_at, update.finished_at, "finished_at", &mut rejected);
        set_once(&mut self.exit_code, update.exit_code, "exit_code", &mut rejected);

        rejected
    }
}

fn set_once<T>(slot: &mut Option<T>, value: Option<T>, name: &'static str, rejected: &mut Vec<&'static str>) {
    if let Some(v) = value {
        if slot.is_none() {
            *slot = Some(v);
        } else {
            rejected.push(name);
        }
    }
}

/// Partial update for [`JobStore::update`](crate::JobStore::update).
///
/// Unset fields are left untouched. The log is not part of it: lines go
/// through [`JobStore::append_log`](crate::JobStore::append_log).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub started_at: Option<f64>,
    pub finished_at: Option<f64>,
    pub exit_code: Option<i32>,
}

impl JobUpdate {
    /// `queued → running` with `started_at = now`.
    pub fn running() -> Self {
        Self {
            status: Some(JobStatus::Running),
            started_at: Some(unix_now()),
            ..Self::default()
        }
    }

    /// Terminal transition derived from an exit code, with `finished_at = now`.
    pub fn completed(exit_code: i32) -> Self {
        let status = if exit_code == 0 {
            JobStatus::Finished
        } else {
            JobStatus::Failed
        };
        Self {
            status: Some(status),
            finished_at: Some(unix_now()),
            exit_code: Some(exit_code),
            ..Self::default()
        }
    }

    /// Sets the status only.
    #[inline]
    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
