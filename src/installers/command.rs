//! # External-process installer.
//!
//! Spawns `<program> <args..> <package>` without a shell, reads stdout and
//! stderr line by line (merged in arrival order), and reports the exit code.
//!
//! ## Rules
//! - The package name is passed as a single argv element; no shell ever parses it.
//! - Output is decoded lossily; a trailing `\r` is stripped.
//! - On cancellation the child is killed and reaped before returning
//!   [`InstallError::Canceled`]. Every other exit path drops the child with
//!   `kill_on_drop` set.
//! - A child killed by a signal reports `128 + signo` (unix).

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::select;
use tokio_stream::wrappers::SplitStream;
use tokio_util::sync::CancellationToken;

use super::{Installer, JobReporter};
use crate::error::InstallError;

/// Installer backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CommandInstaller {
    /// Runs `program args.. <package>`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            envs: Vec::new(),
        }
    }

    /// `apt-get install -y <package>`, through `sudo -n` when `elevate` is set.
    pub fn apt(elevate: bool) -> Self {
        let installer = if elevate {
            Self::new("sudo", ["-n", "apt-get", "install", "-y"])
        } else {
            Self::new("apt-get", ["install", "-y"])
        };
        installer.with_env("DEBIAN_FRONTEND", "noninteractive")
    }

    /// Adds an environment variable for the child.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn command(&self, package: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(package)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn install(
        &self,
        package: &str,
        reporter: &JobReporter,
        ctx: CancellationToken,
    ) -> Result<i32, InstallError> {
        let mut child = self
            .command(package)
            .spawn()
            .map_err(|source| InstallError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        tracing::debug!(job_id = %reporter.job_id(), pid = ?child.id(), program = %self.program, "install process spawned");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("stdout not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("stderr not captured"))?;
        let mut lines = futures::stream::select(
            SplitStream::new(BufReader::new(stdout).split(b'\n')),
            SplitStream::new(BufReader::new(stderr).split(b'\n')),
        );

        loop {
            select! {
                biased;
                _ = ctx.cancelled() => {
                    terminate(&mut child, reporter).await;
                    return Err(InstallError::Canceled);
                }
                next = lines.next() => match next {
                    Some(Ok(raw)) => reporter.line(decode_line(&raw)).await,
                    Some(Err(err)) => return Err(err.into()),
                    None => break,
                }
            }
        }

        let status = select! {
            biased;
            _ = ctx.cancelled() => None,
            status = child.wait() => Some(status),
        };
        match status {
            Some(status) => Ok(exit_code(status?)),
            None => {
                terminate(&mut child, reporter).await;
                Err(InstallError::Canceled)
            }
        }
    }
}

/// Kills the child and waits for it so no zombie is left behind.
async fn terminate(child: &mut Child, reporter: &JobReporter) {
    if let Err(err) = child.kill().await {
        tracing::warn!(job_id = %reporter.job_id(), %err, "failed to kill install process");
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    // No code and no signal: status unavailable.
    InstallError::IO_FAILED_EXIT_CODE
}

#[cfg(all(test, unix))]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::events::EventBus;
    use crate::jobs::JobStore;

    async fn reporter() -> (JobReporter, Arc<JobStore>) {
        let store = Arc::new(JobStore::new());
        let bus = Arc::new(EventBus::new(Duration::from_millis(100), 64));
        let job = store.enqueue("pkg").await;
        (JobReporter::new(job.job_id, Arc::clone(&store), bus), store)
    }

    fn script(body: &str) -> CommandInstaller {
        // `sh -c <body> sh <package>`: the package lands in $1.
        CommandInstaller::new("sh", ["-c", body, "sh"])
    }

    #[tokio::test]
    async fn test_streams_lines_and_exit_code() {
        let (reporter, store) = reporter().await;
        let code = script("echo \"installing $1\"; echo done; exit 3")
            .install("vim", &reporter, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(code, 3);
        let log = store.get(&reporter.job_id()).await.unwrap().log;
        assert_eq!(log, vec!["installing vim", "done"]);
    }

    #[tokio::test]
    async fn test_stderr_is_captured() {
        let (reporter, store) = reporter().await;
        let code = script("echo oops >&2")
            .install("vim", &reporter, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(code, 0);
        let log = store.get(&reporter.job_id()).await.unwrap().log;
        assert_eq!(log, vec!["oops"]);
    }

    #[tokio::test]
    async fn test_package_is_not_shell_parsed() {
        let (reporter, store) = reporter().await;
        let code = CommandInstaller::new("echo", Vec::<String>::new())
            .install("vim; echo pwned", &reporter, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(code, 0);
        let log = store.get(&reporter.job_id()).await.unwrap().log;
        assert_eq!(log, vec!["vim; echo pwned"]);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let (reporter, _store) = reporter().await;
        let res = CommandInstaller::new("/nonexistent/debease-installer", Vec::<String>::new())
            .install("vim", &reporter, CancellationToken::new())
            .await;

        let err = res.unwrap_err();
        assert!(matches!(err, InstallError::Spawn { .. }));
        assert_eq!(err.exit_code(), InstallError::SPAWN_FAILED_EXIT_CODE);
    }

    #[tokio::test]
    async fn test_cancellation_kills_process() {
        let (reporter, _store) = reporter().await;
        let ctx = CancellationToken::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let res = script("echo start; exec sleep 30")
            .install("vim", &reporter, ctx)
            .await;

        assert!(matches!(res, Err(InstallError::Canceled)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_decode_line_strips_carriage_return() {
        assert_eq!(decode_line(b"abc\r"), "abc");
        assert_eq!(decode_line(&[0x66, 0xff, 0x6f]), "f\u{fffd}o");
    }
}
