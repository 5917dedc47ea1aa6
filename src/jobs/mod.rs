//! Install jobs: the record type and the store that owns them.
//!
//! ## Contents
//! - [`InstallJob`], [`JobId`], [`JobStatus`], [`JobUpdate`] the lifecycle record
//! - [`JobStore`] record table + FIFO behind one lock

mod job;
mod store;

pub use job::{InstallJob, JobId, JobStatus, JobUpdate, unix_now};
pub use store::JobStore;
