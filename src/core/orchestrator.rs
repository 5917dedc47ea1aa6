//! # Orchestrator: owns the job store, event bus and worker pool.
//!
//! The [`Orchestrator`] is the explicitly constructed context that the HTTP
//! layer and the worker loops share. There are no process-wide globals:
//! everything reaches handlers through [`AppState`] and loops through
//! [`WorkerPool`].
//!
//! ## High-level architecture
//! ```text
//! POST /enqueue ──► JobStore::enqueue ──► FIFO
//!                                          │
//!                         ┌────────────────┼────────────────┐
//!                         ▼                ▼                ▼
//!                     worker 0         worker 1   ...   worker N-1
//!                         │ run_job()      │                │
//!                         ▼                ▼                ▼
//!                  Installer::install ──► JobReporter ──► JobStore (log)
//!                                              └────────► EventBus::broadcast
//!                                                             │
//!                                              ┌──────────────┼──────────────┐
//!                                              ▼              ▼              ▼
//!                                           /ws #1         /ws #2   ...   /ws #M
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use debease::{Config, Orchestrator, SimulatedInstaller};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::builder(Config::default())
//!         .with_installer(Arc::new(SimulatedInstaller::new(2, Duration::from_millis(1))))
//!         .build();
//!     orch.start().await;
//!
//!     let job = orch.store().enqueue("vim").await;
//!     let mut done = false;
//!     for _ in 0..100 {
//!         if orch.store().get(&job.job_id).await.is_some_and(|j| j.status.is_terminal()) {
//!             done = true;
//!             break;
//!         }
//!         tokio::time::sleep(Duration::from_millis(5)).await;
//!     }
//!     assert!(done);
//!
//!     orch.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;

use super::builder::OrchestratorBuilder;
use crate::{
    config::Config,
    core::pool::WorkerPool,
    error::RuntimeError,
    events::EventBus,
    http::{self, AppState},
    jobs::JobStore,
    packages::PackageCatalog,
};

/// Shared runtime context.
pub struct Orchestrator {
    pub(crate) cfg: Config,
    pub(crate) store: Arc<JobStore>,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) catalog: Arc<PackageCatalog>,
    pub(crate) pool: WorkerPool,
    pub(crate) shutdown: CancellationToken,
}

impl Orchestrator {
    /// Starts building an orchestrator from `cfg`.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    #[inline]
    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    #[inline]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    #[inline]
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Token fired by [`shutdown`](Self::shutdown) after the pool has drained.
    #[inline]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Dependencies for the HTTP layer.
    pub fn state(&self) -> AppState {
        AppState {
            store: Arc::clone(&self.store),
            bus: Arc::clone(&self.bus),
            catalog: Arc::clone(&self.catalog),
            shutdown: self.shutdown.clone(),
        }
    }

    /// Application router wired to this orchestrator.
    pub fn router(&self) -> Router {
        http::router(self.state(), self.cfg.static_dir.as_deref())
    }

    /// Spawns the worker loops.
    pub async fn start(&self) {
        self.pool.start().await;
    }

    /// Stops the worker pool, then releases real-time connections.
    ///
    /// `job_finished` for cancelled jobs is broadcast before sockets close.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let res = self.pool.stop().await;
        self.shutdown.cancel();
        res
    }
}
