// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observability types: [`TrainingProgressEvent`] (the wire shape streamed
//! to subscribers) and [`JobLogEntry`] (the superset persisted to
//! `events.jsonl`), plus the [`Stage`] lifecycle coordinate and [`LogLevel`].

use crate::id::{CorrelationId, JobId};
use crate::job::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;

/// A coordinate in a job's lifecycle finer-grained than [`JobStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Queued,
    Initializing,
    PreparingDataset,
    Captioning,
    Training,
    Sampling,
    Exporting,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    Stage {
        Queued => "queued",
        Initializing => "initializing",
        PreparingDataset => "preparing_dataset",
        Captioning => "captioning",
        Training => "training",
        Sampling => "sampling",
        Exporting => "exporting",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Minimum level for a log record, per spec §4.1/§6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

crate::simple_display! {
    LogLevel {
        Debug => "DEBUG",
        Info => "INFO",
        Warning => "WARNING",
        Error => "ERROR",
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(()),
        }
    }
}

/// The unit of observability streamed over SSE (spec §3 `TrainingProgressEvent`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgressEvent {
    pub job_id: JobId,
    pub correlation_id: CorrelationId,
    pub timestamp: DateTime<Utc>,
    pub status: JobStatus,
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_total: Option<u64>,
    pub progress_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
}

/// The line-delimited JSON shape persisted to `events.jsonl` (spec §3/§6):
/// a superset of [`TrainingProgressEvent`] plus `level`, `event`, and a
/// free-form `fields` map. Field names match the wire format verbatim
/// (`ts`, `msg`, ...), not Rust naming conventions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobLogEntry {
    pub ts: DateTime<Utc>,
    pub level: LogLevel,
    pub service: String,
    pub job_id: JobId,
    /// Dotted event name, e.g. `training.step`, `job.start`, `subprocess.stderr`.
    pub event: String,
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<JsonMap<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps_total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
}

impl JobLogEntry {
    /// Projects this entry down to the [`TrainingProgressEvent`] wire shape
    /// the SSE endpoint streams, per spec §4.6. Returns `None` for entries
    /// that carry no `status`/`stage` (pure service-log chatter) since those
    /// are not forwarded to the progress stream.
    pub fn to_progress_event(&self) -> Option<TrainingProgressEvent> {
        Some(TrainingProgressEvent {
            job_id: self.job_id,
            correlation_id: self.correlation_id?,
            timestamp: self.ts,
            status: self.status?,
            stage: self.stage?,
            step: self.step,
            steps_total: self.steps_total,
            progress_pct: self.progress_pct.unwrap_or(0.0),
            loss: self.loss,
            lr: self.lr,
            eta_seconds: self.eta_seconds,
            message: self.msg.clone(),
            sample_path: self.sample_path.clone(),
            error: self.error.clone(),
            error_type: self.error_type.clone(),
            error_stack: self.error_stack.clone(),
        })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
