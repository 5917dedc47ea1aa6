//! # Job lifecycle events pushed to real-time observers.
//!
//! The [`EventKind`] enum classifies what happened to a job; the [`Event`]
//! struct adds the job id and a wall-clock timestamp.
//!
//! ## Wire format
//! Events serialize to a flat JSON object tagged by `type`:
//! ```text
//! {"type":"job_started","package":"vim","job_id":"…","timestamp":1700000000.25}
//! {"type":"stdout","line":"Reading package lists...","job_id":"…","timestamp":…}
//! {"type":"progress","percent":40,"job_id":"…","timestamp":…}
//! {"type":"job_finished","success":true,"exit_code":0,"job_id":"…","timestamp":…}
//! ```
//!
//! ## Ordering guarantees
//! Per job: `job_started` precedes every `stdout`/`progress`, which precede
//! `job_finished`. Nothing is persisted or replayed.
//!
//! ## Example
//! ```rust
//! use debease::{Event, EventKind, JobId};
//!
//! let id = JobId::new();
//! let ev = Event::progress(id, 40);
//!
//! assert_eq!(ev.kind, EventKind::Progress { percent: 40 });
//! assert!(ev.to_json().unwrap().contains("\"type\":\"progress\""));
//! ```

use serde::{Deserialize, Serialize};

use crate::jobs::{JobId, unix_now};

/// Classification of job events, with kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A worker picked the job up and marked it `running`.
    JobStarted {
        /// Requested package name.
        package: String,
    },

    /// One line of installer output (stdout and stderr merged).
    Stdout {
        /// The line, without its trailing newline.
        line: String,
    },

    /// Completion estimate, 0–100, non-decreasing per job.
    Progress {
        /// Percent complete.
        percent: u8,
    },

    /// The job reached `finished` or `failed`.
    JobFinished {
        /// `true` iff the job ended `finished`.
        success: bool,
        /// Recorded exit code (installer code or a sentinel).
        exit_code: i32,
    },
}

impl EventKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::JobStarted { .. } => "job_started",
            EventKind::Stdout { .. } => "stdout",
            EventKind::Progress { .. } => "progress",
            EventKind::JobFinished { .. } => "job_finished",
        }
    }
}

/// Immutable, timestamped job event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event classification and payload.
    #[serde(flatten)]
    pub kind: EventKind,
    /// Job this event belongs to.
    pub job_id: JobId,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl Event {
    /// Creates an event of the given kind stamped with the current time.
    pub fn new(job_id: JobId, kind: EventKind) -> Self {
        Self {
            kind,
            job_id,
            timestamp: unix_now(),
        }
    }

    #[inline]
    pub fn job_started(job_id: JobId, package: impl Into<String>) -> Self {
        Self::new(
            job_id,
            EventKind::JobStarted {
                package: package.into(),
            },
        )
    }

    #[inline]
    pub fn stdout(job_id: JobId, line: impl Into<String>) -> Self {
        Self::new(job_id, EventKind::Stdout { line: line.into() })
    }

    /// Creates a progress event; `percent` is clamped to 100.
    #[inline]
    pub fn progress(job_id: JobId, percent: u8) -> Self {
        Self::new(
            job_id,
            EventKind::Progress {
                percent: percent.min(100),
            },
        )
    }

    #[inline]
    pub fn job_finished(job_id: JobId, exit_code: i32, success: bool) -> Self {
        Self::new(job_id, EventKind::JobFinished { success, exit_code })
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::JobFinished { .. })
    }

    /// Serializes to the JSON wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
