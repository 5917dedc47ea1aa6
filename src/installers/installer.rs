//! # Installer abstraction.
//!
//! An [`Installer`] performs (or simulates) one package install. It has a
//! single capability: push output lines (and optionally progress) into a
//! [`JobReporter`], then return the final exit code. It receives a
//! [`CancellationToken`] and must stop promptly when it fires, releasing any
//! process it spawned.
//!
//! The installer is selected once at startup ([`from_config`]) and shared by
//! every worker loop.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{CommandInstaller, JobReporter, SimulatedInstaller};
use crate::{config::Config, error::InstallError};

/// Shared handle to an installer.
pub type InstallerRef = Arc<dyn Installer>;

/// # Asynchronous, cancelable install backend.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use debease::{InstallError, Installer, JobReporter};
///
/// struct Noop;
///
/// #[async_trait]
/// impl Installer for Noop {
///     fn name(&self) -> &'static str { "noop" }
///
///     async fn install(
///         &self,
///         package: &str,
///         reporter: &JobReporter,
///         ctx: CancellationToken,
///     ) -> Result<i32, InstallError> {
///         if ctx.is_cancelled() {
///             return Err(InstallError::Canceled);
///         }
///         reporter.line(format!("nothing to do for {package}")).await;
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait Installer: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Installs `package`, streaming output through `reporter`.
    ///
    /// Returns the process exit code (`0` = success). A nonzero code is a
    /// normal outcome, not an error. On cancellation, returns
    /// [`InstallError::Canceled`] after tearing down any child process.
    async fn install(
        &self,
        package: &str,
        reporter: &JobReporter,
        ctx: CancellationToken,
    ) -> Result<i32, InstallError>;
}

/// Picks the installer variant configured for this process.
pub fn from_config(cfg: &Config) -> InstallerRef {
    if cfg.simulate {
        Arc::new(SimulatedInstaller::default())
    } else {
        Arc::new(CommandInstaller::apt(cfg.elevate))
    }
}
