//! Runtime core: worker loops, job execution and lifecycle.
//!
//! The public API from this module is [`Orchestrator`] (with its builder) and
//! [`WorkerPool`].
//!
//! Internal modules:
//! - [`runner`]: executes one job, publishing its lifecycle events;
//! - [`worker`]: one queue consumer loop;
//! - [`pool`]: starts N workers and stops them within a grace period;
//! - [`orchestrator`]: owns store, bus, pool and builds the HTTP state;
//! - [`shutdown`]: OS signal handling.

mod builder;
mod orchestrator;
mod pool;
mod runner;
mod shutdown;
mod worker;

pub use builder::OrchestratorBuilder;
pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
pub use shutdown::wait_for_shutdown_signal;
