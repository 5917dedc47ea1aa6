//! Shared state handed to every request handler.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::events::EventBus;
use crate::jobs::JobStore;
use crate::packages::PackageCatalog;

/// Explicitly constructed dependencies of the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub bus: Arc<EventBus>,
    pub catalog: Arc<PackageCatalog>,
    /// Fired once the server is going down; open `/ws` connections close on it.
    pub shutdown: CancellationToken,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}
