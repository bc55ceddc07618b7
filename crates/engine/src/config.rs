// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment and file-based configuration, following the donor's
//! `daemon::env` pattern of small named accessor functions with
//! documented defaults, plus an optional `config.toml` overlay for fields
//! without a natural environment-variable shape.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};

/// Root directory under which `logs/`, jobs' artifact directories, and
/// the WAL live.
pub fn volume_root() -> PathBuf {
    std::env::var("VOLUME_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/var/lib/oj"))
}

pub fn log_dir() -> PathBuf {
    std::env::var("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| volume_root().join("logs"))
}

/// Minimum level written to the structured logger; `RUST_LOG`-style
/// directive parsed by `tracing_subscriber::EnvFilter`.
pub fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// `"production"` or `"development"`; toggles pretty vs. compact console
/// rendering in development while the on-disk JSON stays the same shape.
pub fn mode() -> String {
    std::env::var("MODE").unwrap_or_else(|_| "production".to_string())
}

/// Queue visibility timeout before a leased-but-unacked item is eligible
/// for redelivery (spec §4.3, default 60s).
pub fn visibility_timeout() -> Duration {
    std::env::var("OJ_VISIBILITY_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(60))
}

/// Forced-cancel deadline after a cancellation is requested (spec §4.5,
/// default 10s).
pub fn cancel_deadline() -> Duration {
    std::env::var("OJ_CANCEL_DEADLINE_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(10))
}

/// Delay before a single retry of a transient plugin failure (spec §4.3,
/// default 30s).
pub fn retry_delay() -> Duration {
    std::env::var("OJ_RETRY_DELAY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// Overlay read from `{VOLUME_ROOT}/config.toml` (or `OJ_CONFIG_PATH`) for
/// fields that don't have a natural environment-variable shape: the set
/// of `error_type` values eligible for a single automatic retry, and a
/// per-job wall-clock timeout ceiling.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileOverlay {
    #[serde(default)]
    pub retryable_error_types: HashSet<String>,
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,
}

impl FileOverlay {
    pub fn load() -> EngineResult<Self> {
        let path = std::env::var("OJ_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| volume_root().join("config.toml"));
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path).map_err(EngineError::Io)?;
        toml::from_str(&raw).map_err(|e| EngineError::Config(e.to_string()))
    }
}

/// Assembled configuration for one daemon process.
#[derive(Debug, Clone)]
pub struct Config {
    pub volume_root: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub mode: String,
    pub visibility_timeout: Duration,
    pub cancel_deadline: Duration,
    pub retry_delay: Duration,
    pub retryable_error_types: HashSet<String>,
    pub job_timeout: Option<Duration>,
}

impl Config {
    pub fn load() -> EngineResult<Self> {
        let overlay = FileOverlay::load()?;
        Ok(Self {
            volume_root: volume_root(),
            log_dir: log_dir(),
            log_level: log_level(),
            mode: mode(),
            visibility_timeout: visibility_timeout(),
            cancel_deadline: cancel_deadline(),
            retry_delay: retry_delay(),
            retryable_error_types: overlay.retryable_error_types,
            job_timeout: overlay.job_timeout_secs.map(Duration::from_secs),
        })
    }

    pub fn is_retryable(&self, error_type: &str) -> bool {
        self.retryable_error_types.contains(error_type)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
