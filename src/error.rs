//! Error types used by the debease runtime, installers and configuration.
//!
//! - [`RuntimeError`]: errors raised by the worker pool itself.
//! - [`InstallError`]: errors raised by a single install execution.
//! - [`ConfigError`]: a malformed `DEBEASE_*` environment value.
//!
//! Job-level failures never surface as errors to the submitter: they are
//! terminal job states. These types exist for logs and for the pool owner.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the worker pool.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some worker loops were still busy and got aborted.
    #[error("shutdown timeout {grace:?} exceeded; {stuck} worker(s) aborted")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of worker loops that did not stop in time.
        stuck: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use debease::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: 1 };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by an install execution.
///
/// A nonzero exit code is **not** an error: installers report it as a normal
/// outcome. These variants cover the cases where no exit code exists.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum InstallError {
    /// The install process could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that was being spawned.
        program: String,
        /// Underlying io error.
        #[source]
        source: std::io::Error,
    },

    /// Reading output or reaping the process failed.
    #[error("install io error: {0}")]
    Io(#[from] std::io::Error),

    /// Execution was cancelled because the pool is shutting down.
    #[error("install cancelled")]
    Canceled,
}

impl InstallError {
    /// Exit code recorded for a spawn failure.
    pub const SPAWN_FAILED_EXIT_CODE: i32 = 127;
    /// Exit code recorded for a cancelled job.
    pub const CANCELED_EXIT_CODE: i32 = -1;
    /// Exit code recorded when reading output or reaping the process failed.
    pub const IO_FAILED_EXIT_CODE: i32 = -2;

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            InstallError::Spawn { .. } => "install_spawn_failed",
            InstallError::Io(_) => "install_io",
            InstallError::Canceled => "install_canceled",
        }
    }

    /// Exit code the job record gets when the install ends with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Spawn { .. } => Self::SPAWN_FAILED_EXIT_CODE,
            InstallError::Io(_) => Self::IO_FAILED_EXIT_CODE,
            InstallError::Canceled => Self::CANCELED_EXIT_CODE,
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
        /// What the parser wanted.
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_error_exit_codes() {
        let spawn = InstallError::Spawn {
            program: "apt-get".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(spawn.exit_code(), 127);
        assert_eq!(spawn.as_label(), "install_spawn_failed");
        assert_eq!(InstallError::Canceled.exit_code(), -1);

        let io = InstallError::from(std::io::Error::other("broken pipe"));
        assert_eq!(io.exit_code(), InstallError::IO_FAILED_EXIT_CODE);
        assert_ne!(io.exit_code(), InstallError::Canceled.exit_code());
    }

    #[test]
    fn test_config_error_message() {
        let err = ConfigError::Invalid {
            key: "DEBEASE_PORT",
            value: "http".into(),
            expected: "integer",
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"http\" for DEBEASE_PORT: expected integer"
        );
    }
}
