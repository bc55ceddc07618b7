// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job record and lifecycle state machine.

use crate::id::{CorrelationId, JobId, JobKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Status of a job. Monotonic except `queued -> cancelled`, which is the
/// only transition allowed before a worker dequeues the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// An attempted status transition that the state machine refuses.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("cannot transition job {job_id} from {from} to {to}: job is already terminal")]
pub struct TerminalTransitionError {
    pub job_id: String,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// The durable record of a unit of work (spec §3 `Job`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub status: JobStatus,
    pub correlation_id: CorrelationId,
    pub config: Json,
    pub progress_pct: f64,
    pub current_step: u64,
    pub total_steps: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<String>,
    /// Supplemental to spec §3: visible retry counter, per §4.5 retry scaffolding.
    #[serde(default)]
    pub retry_count: u32,
}

impl Job {
    pub fn new(
        kind: JobKind,
        correlation_id: CorrelationId,
        config: Json,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: JobId::new(kind),
            kind,
            status: JobStatus::Queued,
            correlation_id,
            config,
            progress_pct: 0.0,
            current_step: 0,
            total_steps: 0,
            error_message: None,
            error_type: None,
            created_at,
            started_at: None,
            ended_at: None,
            artifact_path: None,
            retry_count: 0,
        }
    }

    /// `queued -> running`. No-op (returns Ok) if already running, so a
    /// redelivered envelope doesn't double-transition.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TerminalTransitionError> {
        if self.status.is_terminal() {
            return Err(self.terminal_error(JobStatus::Running));
        }
        if self.status == JobStatus::Queued {
            self.status = JobStatus::Running;
            self.started_at = Some(now);
        }
        Ok(())
    }

    /// Records progress. `progress_pct` is clamped to be monotonically
    /// non-decreasing per spec §3's invariant.
    pub fn record_progress(&mut self, progress_pct: f64, current_step: u64, total_steps: u64) {
        self.progress_pct = progress_pct.max(self.progress_pct).clamp(0.0, 100.0);
        self.current_step = current_step;
        self.total_steps = total_steps;
    }

    pub fn complete(
        &mut self,
        artifact_path: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TerminalTransitionError> {
        if self.status.is_terminal() {
            return Err(self.terminal_error(JobStatus::Completed));
        }
        self.status = JobStatus::Completed;
        self.progress_pct = 100.0;
        self.artifact_path = artifact_path;
        self.ended_at = Some(now);
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        Ok(())
    }

    pub fn fail(
        &mut self,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TerminalTransitionError> {
        if self.status.is_terminal() {
            return Err(self.terminal_error(JobStatus::Failed));
        }
        self.status = JobStatus::Failed;
        self.error_type = Some(error_type.into());
        self.error_message = Some(error_message.into());
        self.ended_at = Some(now);
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
        Ok(())
    }

    /// `queued|running -> cancelled`. Idempotent: cancelling an
    /// already-cancelled job is a no-op success, matching the HTTP
    /// endpoint's documented idempotent 204.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), TerminalTransitionError> {
        if self.status == JobStatus::Cancelled {
            return Ok(());
        }
        if self.status.is_terminal() {
            return Err(self.terminal_error(JobStatus::Cancelled));
        }
        self.status = JobStatus::Cancelled;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Requeues a failed job for a retryable-error retry (spec §4.3/§4.5):
    /// only valid from `Failed`, clears the terminal error fields, and
    /// bumps `retry_count`. A no-op Ok(()) if already requeued for this
    /// attempt (status back to `Queued`).
    pub fn retry(&mut self) -> Result<(), TerminalTransitionError> {
        if self.status == JobStatus::Queued {
            return Ok(());
        }
        if self.status != JobStatus::Failed {
            return Err(self.terminal_error(JobStatus::Queued));
        }
        self.status = JobStatus::Queued;
        self.error_type = None;
        self.error_message = None;
        self.ended_at = None;
        self.retry_count += 1;
        Ok(())
    }

    fn terminal_error(&self, to: JobStatus) -> TerminalTransitionError {
        TerminalTransitionError {
            job_id: self.id.to_string(),
            from: self.status,
            to,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
