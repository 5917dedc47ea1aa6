use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{orchestrator::Orchestrator, pool::WorkerPool};
use crate::{
    config::Config,
    events::EventBus,
    installers::{self, InstallerRef},
    jobs::JobStore,
    packages::PackageCatalog,
};

/// Builder for constructing an [`Orchestrator`] with optional overrides.
pub struct OrchestratorBuilder {
    cfg: Config,
    installer: Option<InstallerRef>,
    catalog: Option<PackageCatalog>,
}

impl OrchestratorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            installer: None,
            catalog: None,
        }
    }

    /// Overrides the installer chosen from [`Config::simulate`].
    pub fn with_installer(mut self, installer: InstallerRef) -> Self {
        self.installer = Some(installer);
        self
    }

    /// Overrides the default package catalog.
    pub fn with_catalog(mut self, catalog: PackageCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builds the orchestrator. Worker loops are not running until `start()`.
    pub fn build(self) -> Orchestrator {
        let store = Arc::new(JobStore::new());
        let bus = Arc::new(EventBus::new(
            self.cfg.broadcast_timeout,
            self.cfg.subscriber_buffer,
        ));
        let installer = self
            .installer
            .unwrap_or_else(|| installers::from_config(&self.cfg));
        let pool = WorkerPool::new(
            self.cfg.workers(),
            self.cfg.shutdown_grace,
            Arc::clone(&store),
            Arc::clone(&bus),
            installer,
        );

        Orchestrator {
            store,
            bus,
            catalog: Arc::new(self.catalog.unwrap_or_default()),
            pool,
            shutdown: CancellationToken::new(),
            cfg: self.cfg,
        }
    }
}
