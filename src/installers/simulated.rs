//! # Deterministic simulated installer.
//!
//! Emits `steps` lines of the form `Simulated output for {package} step {i}`,
//! one every `interval`, each followed by a progress event at `i * 100 / steps`
//! percent. Always exits 0 unless cancelled.

use std::time::Duration;

use async_trait::async_trait;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use super::{Installer, JobReporter};
use crate::error::InstallError;

/// Installer that only sleeps and talks.
#[derive(Debug, Clone)]
pub struct SimulatedInstaller {
    steps: u32,
    interval: Duration,
}

impl SimulatedInstaller {
    /// Creates a simulated installer. `steps` is clamped to a minimum of 1.
    pub fn new(steps: u32, interval: Duration) -> Self {
        Self {
            steps: steps.max(1),
            interval,
        }
    }
}

impl Default for SimulatedInstaller {
    /// 5 steps, 250ms apart.
    fn default() -> Self {
        Self::new(5, Duration::from_millis(250))
    }
}

#[async_trait]
impl Installer for SimulatedInstaller {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn install(
        &self,
        package: &str,
        reporter: &JobReporter,
        ctx: CancellationToken,
    ) -> Result<i32, InstallError> {
        for step in 1..=self.steps {
            select! {
                biased;
                _ = ctx.cancelled() => return Err(InstallError::Canceled),
                _ = time::sleep(self.interval) => {}
            }
            reporter
                .line(format!("Simulated output for {package} step {step}"))
                .await;
            reporter.progress(step_percent(step, self.steps)).await;
        }
        Ok(0)
    }
}

/// Progress after `step` of `steps`, in `0..=100`.
fn step_percent(step: u32, steps: u32) -> u8 {
    let percent = u64::from(step) * 100 / u64::from(steps.max(1));
    percent.min(100) as u8
}
