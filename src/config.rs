//! # Runtime configuration.
//!
//! Provides [`Config`] centralized settings for the server, the worker pool
//! and the event bus. Values come from `DEBEASE_*` environment variables;
//! anything unset keeps its [`Default`].
//!
//! | Variable | Default |
//! |---|---|
//! | `DEBEASE_HOST` | `0.0.0.0` |
//! | `DEBEASE_PORT` | `8080` |
//! | `DEBEASE_SIMULATE_INSTALL` | `true` |
//! | `DEBEASE_WORKER_CONCURRENCY` | `1` |
//! | `DEBEASE_ELEVATE` | `true` |
//! | `DEBEASE_BROADCAST_TIMEOUT_MS` | `2000` |
//! | `DEBEASE_SUBSCRIBER_BUFFER` | `256` |
//! | `DEBEASE_SHUTDOWN_GRACE_SECS` | `10` |
//! | `DEBEASE_STATIC_DIR` | unset |
//!
//! ## Sentinel values
//! - `worker_concurrency = 0` → clamped to 1 by [`Config::workers`]

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Global configuration for the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// `true` = simulated installer, `false` = real `apt-get`.
    pub simulate: bool,
    /// Number of worker loops pulling from the job queue.
    pub worker_concurrency: usize,
    /// Run the real installer through `sudo -n`.
    pub elevate: bool,
    /// Maximum wait per subscriber delivery before it is dropped.
    pub broadcast_timeout: Duration,
    /// Per-subscriber queue length.
    pub subscriber_buffer: usize,
    /// Maximum time `WorkerPool::stop` waits for loops to finalize their jobs.
    pub shutdown_grace: Duration,
    /// Directory with the static UI (`index.html` + assets); not served when unset.
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("DEBEASE_HOST") {
            cfg.host = host;
        }
        if let Some(port) = parse(&lookup, "DEBEASE_PORT", "port number")? {
            cfg.port = port;
        }
        if let Some(simulate) = flag(&lookup, "DEBEASE_SIMULATE_INSTALL")? {
            cfg.simulate = simulate;
        }
        if let Some(n) = parse(&lookup, "DEBEASE_WORKER_CONCURRENCY", "non-negative integer")? {
            cfg.worker_concurrency = n;
        }
        if let Some(elevate) = flag(&lookup, "DEBEASE_ELEVATE")? {
            cfg.elevate = elevate;
        }
        if let Some(ms) = parse(&lookup, "DEBEASE_BROADCAST_TIMEOUT_MS", "milliseconds")? {
            cfg.broadcast_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = parse(&lookup, "DEBEASE_SUBSCRIBER_BUFFER", "non-negative integer")? {
            cfg.subscriber_buffer = n;
        }
        if let Some(secs) = parse(&lookup, "DEBEASE_SHUTDOWN_GRACE_SECS", "seconds")? {
            cfg.shutdown_grace = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("DEBEASE_STATIC_DIR").filter(|d| !d.is_empty()) {
            cfg.static_dir = Some(PathBuf::from(dir));
        }

        Ok(cfg)
    }

    /// Number of worker loops, clamped to a minimum of 1.
    #[inline]
    pub fn workers(&self) -> usize {
        self.worker_concurrency.max(1)
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `0.0.0.0:8080`
    /// - simulated installer, one worker loop
    /// - real installer elevated via sudo
    /// - `broadcast_timeout = 2s`, `subscriber_buffer = 256`
    /// - `shutdown_grace = 10s`
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            simulate: true,
            worker_concurrency: 1,
            elevate: true,
            broadcast_timeout: Duration::from_secs(2),
            subscriber_buffer: 256,
            shutdown_grace: Duration::from_secs(10),
            static_dir: None,
        }
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, expected: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key,
                value: raw,
                expected,
            }),
    }
}

/// `1/true/yes/on` → true, `0/false/no/off` → false (case-insensitive).
fn flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw,
            expected: "boolean",
        }),
    }
}
