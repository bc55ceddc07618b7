// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job structured logger (spec §4.4): builds [`JobLogEntry`] JSON
//! lines, appends them under an advisory file lock to
//! `{volume}/logs/jobs/{job_id}/events.jsonl`, and publishes the
//! projected [`TrainingProgressEvent`] to the bus. The file write happens
//! before the broadcast send, so persistence never depends on whether
//! anyone is subscribed.

use chrono::Utc;
use fs2::FileExt;
use oj_core::{CorrelationId, JobId, JobLogEntry, JobStatus, LogLevel, Stage};
use std::fs::OpenOptions;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::bus::EventBus;
use crate::error::EngineResult;

pub struct JobLogger {
    job_id: JobId,
    correlation_id: CorrelationId,
    events_path: PathBuf,
    samples_dir: PathBuf,
    bus: Arc<EventBus>,
    sequence: AtomicU64,
}

impl JobLogger {
    pub fn new(
        volume_root: &Path,
        job_id: JobId,
        correlation_id: CorrelationId,
        bus: Arc<EventBus>,
    ) -> EngineResult<Self> {
        let job_dir = volume_root.join("logs/jobs").join(job_id.as_str());
        std::fs::create_dir_all(&job_dir)?;
        let samples_dir = job_dir.join("samples");
        std::fs::create_dir_all(&samples_dir)?;
        Ok(Self {
            job_id,
            correlation_id,
            events_path: job_dir.join("events.jsonl"),
            samples_dir,
            bus,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// Monotonic per-process counter written into a log line's context to
    /// break timestamp ties when reconstructing total order across
    /// services (spec §4.4 "Ordering guarantees").
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    fn blank_entry(&self, level: LogLevel, event: impl Into<String>, msg: impl Into<String>) -> JobLogEntry {
        JobLogEntry {
            ts: Utc::now(),
            level,
            service: "worker".to_string(),
            job_id: self.job_id,
            event: event.into(),
            msg: msg.into(),
            correlation_id: Some(self.correlation_id),
            fields: None,
            status: None,
            stage: None,
            step: None,
            steps_total: None,
            progress_pct: None,
            loss: None,
            lr: None,
            eta_seconds: None,
            sample_path: None,
            error: None,
            error_type: None,
            error_stack: None,
        }
    }

    /// Appends `entry` to the job's `events.jsonl` under an exclusive
    /// advisory lock (shared with the API's `/logs/view` reader) and, if
    /// the entry carries `status`/`stage`, publishes the projected
    /// progress event to the bus.
    pub fn append(&self, mut entry: JobLogEntry) -> EngineResult<()> {
        entry.job_id = self.job_id;
        if entry.correlation_id.is_none() {
            entry.correlation_id = Some(self.correlation_id);
        }
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)?;
        file.lock_exclusive()?;
        let write_result = (&file).write_all(line.as_bytes());
        let _ = FileExt::unlock(&file);
        write_result?;

        if let Some(progress) = entry.to_progress_event() {
            self.bus.publish(&self.job_id, progress);
        }
        Ok(())
    }

    pub fn info(&self, event: impl Into<String>, msg: impl Into<String>) -> EngineResult<()> {
        self.append(self.blank_entry(LogLevel::Info, event, msg))
    }

    pub fn warn(&self, event: impl Into<String>, msg: impl Into<String>) -> EngineResult<()> {
        self.append(self.blank_entry(LogLevel::Warning, event, msg))
    }

    pub fn error(&self, event: impl Into<String>, msg: impl Into<String>) -> EngineResult<()> {
        self.append(self.blank_entry(LogLevel::Error, event, msg))
    }

    /// Records training/generation progress, matching the plugin contract
    /// (spec §4.5): `logger.info(event="training.step", step=…,
    /// steps_total=…, loss=…, lr=…)`.
    #[allow(clippy::too_many_arguments)]
    pub fn progress(
        &self,
        status: JobStatus,
        stage: Stage,
        step: Option<u64>,
        steps_total: Option<u64>,
        progress_pct: f64,
        loss: Option<f64>,
        lr: Option<f64>,
        eta_seconds: Option<f64>,
        msg: impl Into<String>,
    ) -> EngineResult<()> {
        let mut entry = self.blank_entry(LogLevel::Info, "training.step", msg);
        entry.status = Some(status);
        entry.stage = Some(stage);
        entry.step = step;
        entry.steps_total = steps_total;
        entry.progress_pct = Some(progress_pct);
        entry.loss = loss;
        entry.lr = lr;
        entry.eta_seconds = eta_seconds;
        self.append(entry)
    }

    /// Records that a sample artifact was written to the job's sample
    /// directory (`logger.sample(step, path)`, spec §4.5).
    pub fn sample(&self, step: u32, path: impl Into<String>) -> EngineResult<()> {
        let path = path.into();
        let mut entry = self.blank_entry(LogLevel::Info, "training.sample", format!("sample written: {path}"));
        entry.step = Some(step as u64);
        entry.sample_path = Some(path);
        self.append(entry)
    }

    /// Publishes one of the executor's required lifecycle markers
    /// (`training.start`, `training.complete`, `training.failed`) with the
    /// job's current status/stage, so the SSE endpoint has a status-bearing
    /// event to decide when to close the stream (spec §4.4/§4.6).
    pub fn lifecycle(
        &self,
        event: impl Into<String>,
        status: JobStatus,
        stage: Stage,
        progress_pct: f64,
        msg: impl Into<String>,
    ) -> EngineResult<()> {
        let mut entry = self.blank_entry(LogLevel::Info, event, msg);
        entry.status = Some(status);
        entry.stage = Some(stage);
        entry.progress_pct = Some(progress_pct);
        self.append(entry)
    }

    pub fn failure(
        &self,
        status: JobStatus,
        stage: Stage,
        error_type: impl Into<String>,
        error: impl Into<String>,
        error_stack: Option<String>,
    ) -> EngineResult<()> {
        let error_type = error_type.into();
        let error = error.into();
        let mut entry = self.blank_entry(LogLevel::Error, "job.failed", error.clone());
        entry.status = Some(status);
        entry.stage = Some(stage);
        entry.progress_pct = Some(0.0);
        entry.error = Some(error);
        entry.error_type = Some(error_type);
        entry.error_stack = error_stack;
        self.append(entry)
    }

    /// The last `limit` events from the file tail, for a late-connecting
    /// SSE subscriber or the `/logs/view` endpoint (spec §4.4 `history`).
    pub fn history(&self, limit: usize) -> EngineResult<Vec<JobLogEntry>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }
        let file = std::fs::File::open(&self.events_path)?;
        let reader = std::io::BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<JobLogEntry>(&line) {
                entries.push(entry);
            }
        }
        let start = entries.len().saturating_sub(limit);
        Ok(entries.split_off(start))
    }
}

#[async_trait::async_trait]
impl oj_core::ProgressSink for JobLogger {
    async fn log(&self, entry: JobLogEntry) {
        if let Err(err) = self.append(entry) {
            tracing::error!(job_id = %self.job_id, error = %err, "failed to append job log entry");
        }
    }
}

#[cfg(test)]
#[path = "job_logger_tests.rs"]
mod tests;
