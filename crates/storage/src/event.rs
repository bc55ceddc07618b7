// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The internal event-sourcing log. Distinct from `oj_core::event`'s
//! API-observable `TrainingProgressEvent`/`JobLogEntry` — these are the
//! facts the WAL persists and `MaterializedState` replays.

use chrono::{DateTime, Utc};
use oj_core::{CorrelationId, JobId, JobKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    JobCreated {
        job_id: JobId,
        kind: JobKind,
        correlation_id: CorrelationId,
        config: serde_json::Value,
        created_at: DateTime<Utc>,
    },
    JobStarted {
        job_id: JobId,
        started_at: DateTime<Utc>,
    },
    JobProgressRecorded {
        job_id: JobId,
        progress_pct: f64,
        current_step: u64,
        total_steps: u64,
    },
    JobCompleted {
        job_id: JobId,
        artifact_path: Option<String>,
        ended_at: DateTime<Utc>,
    },
    JobFailed {
        job_id: JobId,
        error_type: String,
        error_message: String,
        ended_at: DateTime<Utc>,
    },
    JobCancelled {
        job_id: JobId,
        ended_at: DateTime<Utc>,
    },
    JobRetried {
        job_id: JobId,
        retry_count: u32,
    },
    QueuePushed {
        item_id: String,
        job_id: JobId,
        correlation_id: CorrelationId,
        enqueued_at: DateTime<Utc>,
    },
    QueueLeased {
        item_id: String,
        leased_at: DateTime<Utc>,
    },
    QueueAcked {
        item_id: String,
    },
    QueueNacked {
        item_id: String,
    },
    QueueDead {
        item_id: String,
    },
    /// Control event, never replayed into state; lets the daemon engine
    /// loop detect a clean shutdown was requested before the crash that
    /// truncated the WAL tail, mirroring the donor's `Event::Shutdown`.
    Shutdown,
}
