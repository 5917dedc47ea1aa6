//! Install backends and the output sink they report through.
//!
//! - [`Installer`] the one-capability backend trait, selected once via [`from_config`]
//! - [`SimulatedInstaller`] deterministic demo/test backend
//! - [`CommandInstaller`] external process (`apt-get install -y`)
//! - [`JobReporter`] mirrors output into the job log and the event bus

mod command;
mod installer;
mod reporter;
mod simulated;

pub use command::CommandInstaller;
pub use installer::{Installer, InstallerRef, from_config};
pub use reporter::JobReporter;
pub use simulated::SimulatedInstaller;
