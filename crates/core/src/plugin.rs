// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The plugin contract the executor uses to invoke swappable training and
//! generation backends (spec §4.5). The backends themselves are external
//! collaborators; `oj-adapters` provides the two concrete implementations
//! this workspace ships.

use serde_json::Value as Json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::event::JobLogEntry;

/// Cooperative cancellation signal, checked by the plugin at the same
/// cadence it reports progress (spec §4.5). Cloning shares the same
/// underlying flag.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A schema of accepted config keys and their ranges, reported by
/// `capabilities()` and used by the API's config validator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PluginCapabilities {
    pub backend: String,
    /// Maps config key -> a human-readable description of its accepted range.
    pub parameters: std::collections::BTreeMap<String, String>,
    pub wired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PluginCapabilities {
    /// Validates a config object against the declared parameter schema.
    /// Returns the name of the first unsupported key found, if any.
    pub fn reject_unsupported(&self, config: &Json) -> Option<String> {
        let obj = config.as_object()?;
        obj.keys()
            .find(|key| !self.parameters.contains_key(key.as_str()))
            .cloned()
    }
}

/// The outcome of a plugin's `run()` invocation.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RunResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
    #[serde(default)]
    pub samples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// A sink the plugin uses to report progress; implemented by
/// `oj-engine`'s `JobLogger` so `oj-adapters` doesn't need to depend on
/// `oj-engine`.
#[async_trait::async_trait]
pub trait ProgressSink: Send + Sync {
    async fn log(&self, entry: JobLogEntry);
}

/// External collaborator invoked by the executor (spec §4.5 Plugin contract).
#[async_trait::async_trait]
pub trait Plugin: Send + Sync {
    fn capabilities(&self) -> PluginCapabilities;

    async fn run(
        &self,
        config: Json,
        logger: Arc<dyn ProgressSink>,
        cancel_token: CancelToken,
    ) -> RunResult;
}

/// Runtime paths the executor injects into a job's config before handing
/// it to a plugin. The config a caller submits to `POST /training` or
/// `POST /generation` is validated against `PluginCapabilities::parameters`
/// and never contains these keys; the executor adds them afterward so the
/// plugin knows where to write samples and artifacts without the plugin
/// contract itself needing a path parameter.
pub mod runtime_keys {
    pub const JOB_ID: &str = "__job_id";
    pub const SAMPLE_DIR: &str = "__sample_dir";
    pub const VOLUME_ROOT: &str = "__volume_root";
}
