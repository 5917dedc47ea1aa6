//! # debease
//!
//! **debease** is a single-process package-install orchestrator.
//!
//! It accepts install requests, serializes them through a FIFO work queue,
//! runs them on a fixed-size worker pool, and streams structured
//! lifecycle/progress events to every connected real-time observer.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   POST /enqueue        GET /queue         GET /ws (×M)
//!        │                   │                  ▲
//!        ▼                   ▼                  │ JSON events
//! ┌───────────────────────────────────┐   ┌─────┴───────────────────────┐
//! │ JobStore (one lock domain)        │   │ EventBus                    │
//! │ - jobs: id → InstallJob           │   │ - per-subscriber queues     │
//! │ - FIFO of ids                     │   │ - send timeout, eviction    │
//! └──────┬────────────────────────────┘   └─────▲───────────────────────┘
//!        │ dequeue()                            │ broadcast()
//!        ▼                                      │
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ WorkerPool: worker 0 … worker N-1 (each: dequeue → run_job)       │
//! │   run_job: running → job_started → Installer::install → finished  │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//!   Installer (SimulatedInstaller | CommandInstaller "apt-get install -y")
//! ```
//!
//! ### Job lifecycle
//! ```text
//! queued ──(dequeued)──► running ──(exit 0)──────────► finished
//!                               ├─(exit ≠ 0 / spawn)─► failed (code / 127)
//!                               └─(pool shutdown)────► failed (-1)
//! ```
//!
//! ## Features
//! | Area             | Description                                              | Key types                               |
//! |------------------|----------------------------------------------------------|-----------------------------------------|
//! | **Jobs**         | Job records, forward-only state machine, FIFO            | [`JobStore`], [`InstallJob`], [`JobStatus`] |
//! | **Events**       | JSON lifecycle events, timeout-bounded fan-out           | [`EventBus`], [`Event`], [`EventKind`]  |
//! | **Execution**    | Worker loops with cooperative cancellation               | [`WorkerPool`], [`Orchestrator`]        |
//! | **Installers**   | Simulated or real (`apt-get`) backends                   | [`Installer`], [`JobReporter`]          |
//! | **HTTP**         | axum router: enqueue, queue, packages, websocket         | [`router`], [`AppState`]                |
//! | **Configuration**| `DEBEASE_*` environment settings                         | [`Config`]                              |
//! | **Errors**       | Typed errors with stable labels                          | [`RuntimeError`], [`InstallError`]      |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use debease::{Config, Event, EventKind, Orchestrator};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::builder(Config::default()).build();
//!     let mut sub = orch.bus().subscribe().await;
//!     orch.start().await;
//!
//!     orch.store().enqueue("vim").await;
//!     while let Some(raw) = sub.recv().await {
//!         let ev: Event = serde_json::from_str(&raw)?;
//!         if let EventKind::JobFinished { success, .. } = ev.kind {
//!             assert!(success);
//!             break;
//!         }
//!     }
//!
//!     orch.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod http;
mod installers;
mod jobs;
mod packages;

// ---- Public re-exports ----

pub use config::Config;
pub use crate::core::{Orchestrator, OrchestratorBuilder, WorkerPool, wait_for_shutdown_signal};
pub use error::{ConfigError, InstallError, RuntimeError};
pub use events::{Event, EventBus, EventKind, SubscriberId, Subscription};
pub use http::{ApiError, AppState, EnqueueRequest, EnqueueResponse, router, validate_package};
pub use installers::{CommandInstaller, Installer, InstallerRef, JobReporter, SimulatedInstaller};
pub use jobs::{InstallJob, JobId, JobStatus, JobStore, JobUpdate};
pub use packages::{PackageCatalog, PackageMetadata, PackagePage};
