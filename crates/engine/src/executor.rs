// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker's job executor (spec §4.5): a single long-running loop that
//! dequeues envelopes, restores correlation context, invokes the matching
//! plugin, and translates the result into a terminal status. The shape
//! follows the donor's `Executor` (shared `Arc` state, a unit-testable
//! `run_once` wrapped by an outer `serve` loop the daemon spawns as a
//! task).

use chrono::Utc;
use oj_core::{CancelToken, CorrelationId, Job, JobId, JobKind, JobStatus, Plugin, ProgressSink, Stage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::bus::EventBus;
use crate::config::Config;
use crate::correlation;
use crate::error::EngineResult;
use crate::job_logger::JobLogger;

/// Shared worker state: the store, bus, configuration, and the plugin
/// registered for each job kind. Cloned cheaply (everything behind `Arc`)
/// so the daemon can hand a copy to the SSE/log-view handlers alongside
/// the serve task.
pub struct Executor {
    store: Arc<oj_storage::JobStore>,
    bus: Arc<EventBus>,
    config: Config,
    plugins: HashMap<JobKind, Arc<dyn Plugin>>,
    cancel_tokens: Mutex<HashMap<String, CancelToken>>,
}

impl Executor {
    pub fn new(
        store: Arc<oj_storage::JobStore>,
        bus: Arc<EventBus>,
        config: Config,
        plugins: HashMap<JobKind, Arc<dyn Plugin>>,
    ) -> Self {
        Self {
            store,
            bus,
            config,
            plugins,
            cancel_tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Flips the in-memory cancel signal for a currently-running job, if
    /// one is registered. Returns `false` if the job isn't presently
    /// running (the caller should rely on the store's `cancelled` status
    /// alone in that case: the executor will observe it on dequeue).
    pub fn signal_cancel(&self, job_id: &str) -> bool {
        match self.cancel_tokens.lock().get(job_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Runs the dequeue loop until `shutdown` resolves. Idle ticks back
    /// off briefly so an empty queue doesn't spin.
    pub async fn serve(self: Arc<Self>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("executor shutting down");
                        return;
                    }
                }
                did_work = self.run_once() => {
                    match did_work {
                        Ok(true) => {}
                        Ok(false) => tokio::time::sleep(Duration::from_millis(250)).await,
                        Err(err) => {
                            tracing::error!(error = %err, "executor tick failed");
                            tokio::time::sleep(Duration::from_millis(250)).await;
                        }
                    }
                }
            }
        }
    }

    /// Requeues any leased item whose visibility timeout has elapsed
    /// (spec §4.3 at-least-once delivery), then leases and executes the
    /// next pending item, if any. Returns whether it did anything.
    pub async fn run_once(&self) -> EngineResult<bool> {
        let now = Utc::now();

        let visibility_timeout = chrono::Duration::from_std(self.config.visibility_timeout)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));
        for expired in self.store.expired_leases(now, visibility_timeout) {
            tracing::warn!(item_id = %expired.id, job_id = %expired.job_id, "lease expired, redelivering");
            self.store.nack(expired.id)?;
        }

        let Some(item) = self.store.lease_next(now)? else {
            return Ok(false);
        };

        let Some(job) = self.store.get_job(item.job_id.as_str()) else {
            tracing::warn!(job_id = %item.job_id, "leased item referenced an unknown job, dropping");
            self.store.ack(item.id)?;
            return Ok(true);
        };

        if job.status == JobStatus::Cancelled {
            tracing::info!(job_id = %job.id, "job cancelled before dequeue, skipping execution");
            self.store.ack(item.id)?;
            return Ok(true);
        }
        if job.status.is_terminal() {
            self.store.ack(item.id)?;
            return Ok(true);
        }

        let item_id = item.id.clone();
        correlation::scope(item.correlation_id, self.execute(job, item.correlation_id)).await;
        self.store.ack(item_id)?;
        Ok(true)
    }

    async fn execute(&self, job: Job, correlation_id: CorrelationId) {
        let job_id = job.id;
        if let Err(err) = self.store.start_job(job_id, Utc::now()) {
            tracing::error!(job_id = %job_id, error = %err, "failed to mark job running");
            return;
        }

        let logger = match JobLogger::new(&self.config.volume_root, job_id, correlation_id, self.bus.clone()) {
            Ok(logger) => Arc::new(logger),
            Err(err) => {
                tracing::error!(job_id = %job_id, error = %err, "failed to construct job logger");
                let _ = self.store.fail_job(job_id, "LoggerInitError", err.to_string(), Utc::now());
                return;
            }
        };

        let _ = logger.lifecycle("training.start", JobStatus::Running, Stage::Initializing, 0.0, "job started");

        let Some(plugin) = self.plugins.get(&job.kind).cloned() else {
            let msg = format!("no plugin registered for backend {}", job.kind);
            let _ = logger.failure(JobStatus::Failed, Stage::Failed, "PluginUnavailable", msg.as_str(), None);
            let _ = self.store.fail_job(job_id, "PluginUnavailable", msg, Utc::now());
            return;
        };

        let cancel_token = CancelToken::new();
        self.cancel_tokens
            .lock()
            .insert(job_id.as_str().to_string(), cancel_token.clone());

        let runtime_config = self.inject_runtime_paths(&job.id, &logger, job.config.clone());
        let result = self.run_with_cancel_deadline(plugin, runtime_config, logger.clone(), cancel_token.clone()).await;

        self.cancel_tokens.lock().remove(job_id.as_str());

        let now = Utc::now();
        if cancel_token.is_set() {
            let _ = logger.lifecycle("training.cancelled", JobStatus::Cancelled, Stage::Cancelled, job.progress_pct, "job cancelled");
            let _ = self.store.cancel_job(job_id, now);
            return;
        }

        if result.success {
            let _ = logger.lifecycle("training.complete", JobStatus::Completed, Stage::Completed, 100.0, "job completed");
            let _ = self.store.complete_job(job_id, result.artifact_path.clone(), now);
            return;
        }

        let error_type = result.error_type.clone().unwrap_or_else(|| "UnknownError".to_string());
        let error_message = result.error.clone().unwrap_or_else(|| "plugin run failed".to_string());
        let _ = logger.failure(JobStatus::Failed, Stage::Failed, error_type.as_str(), error_message.as_str(), None);
        let _ = self.store.fail_job(job_id, error_type.clone(), error_message, now);

        if self.config.is_retryable(&error_type) {
            self.schedule_retry(job_id, correlation_id);
        }
    }

    /// Adds the `__job_id`/`__sample_dir`/`__volume_root` runtime keys a
    /// plugin needs to know where to write, without making the plugin
    /// contract itself carry path parameters (spec §4.5's config is
    /// otherwise opaque-to-the-core). These keys never reach the config a
    /// caller submits: `PluginCapabilities::reject_unsupported` runs at
    /// submission time, before the executor ever sees the job.
    fn inject_runtime_paths(&self, job_id: &JobId, logger: &JobLogger, mut config: serde_json::Value) -> serde_json::Value {
        if !config.is_object() {
            config = serde_json::Value::Object(Default::default());
        }
        let obj = config.as_object_mut().expect("just ensured object");
        obj.insert(oj_core::runtime_keys::JOB_ID.to_string(), serde_json::json!(job_id.as_str()));
        obj.insert(
            oj_core::runtime_keys::SAMPLE_DIR.to_string(),
            serde_json::json!(logger.samples_dir().display().to_string()),
        );
        obj.insert(
            oj_core::runtime_keys::VOLUME_ROOT.to_string(),
            serde_json::json!(self.config.volume_root.display().to_string()),
        );
        config
    }

    /// Runs the plugin to completion, unless a cancellation signal is
    /// observed first, in which case the plugin gets `cancel_deadline` to
    /// return before its task is forcibly aborted (spec §4.5).
    async fn run_with_cancel_deadline(
        &self,
        plugin: Arc<dyn Plugin>,
        config: serde_json::Value,
        logger: Arc<JobLogger>,
        cancel_token: CancelToken,
    ) -> oj_core::RunResult {
        let sink: Arc<dyn ProgressSink> = logger;
        let run_token = cancel_token.clone();
        let mut handle = tokio::spawn(async move { plugin.run(config, sink, run_token).await });

        let watch_token = cancel_token.clone();
        let cancel_observed = async move {
            while !watch_token.is_set() {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };

        tokio::select! {
            result = &mut handle => {
                result.unwrap_or_else(|join_err| oj_core::RunResult {
                    success: false,
                    error: Some(join_err.to_string()),
                    error_type: Some("PluginPanicked".to_string()),
                    ..Default::default()
                })
            }
            _ = cancel_observed => {
                match tokio::time::timeout(self.config.cancel_deadline, &mut handle).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(join_err)) => oj_core::RunResult {
                        success: false,
                        error: Some(join_err.to_string()),
                        error_type: Some("PluginPanicked".to_string()),
                        ..Default::default()
                    },
                    Err(_elapsed) => {
                        handle.abort();
                        oj_core::RunResult {
                            success: false,
                            error: Some("plugin exceeded forced-cancel deadline".to_string()),
                            error_type: Some("ForcedCancel".to_string()),
                            ..Default::default()
                        }
                    }
                }
            }
        }
    }

    /// Requeues a transiently-failed job after the configured retry
    /// delay (spec §4.3/§4.5). Spawned so the dequeue loop isn't blocked
    /// for the delay's duration.
    fn schedule_retry(&self, job_id: JobId, correlation_id: CorrelationId) {
        let store = self.store.clone();
        let delay = self.config.retry_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = store.retry_job(job_id) {
                tracing::warn!(job_id = %job_id, error = %err, "retry_job failed, leaving job failed");
                return;
            }
            if let Err(err) = store.enqueue(job_id, correlation_id, Utc::now()) {
                tracing::error!(job_id = %job_id, error = %err, "failed to re-enqueue retried job");
            }
        });
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
