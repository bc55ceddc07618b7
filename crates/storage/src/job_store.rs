// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The materialized job store and FIFO queue facade (spec §4.3), built the
//! same way the donor builds its effect-sourced state: every mutation
//! appends an [`Event`] to the WAL and immediately replays it into the
//! in-memory [`MaterializedState`] before returning, so callers always see
//! their own write.

use chrono::{DateTime, Utc};
use oj_core::{CorrelationId, Job, JobId, JobKind};
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::path::Path;

use crate::error::{StorageError, StorageResult};
use crate::state::{MaterializedState, QueueItem, QueueItemStatus};
use crate::wal::Wal;
use crate::Event;

struct Inner {
    wal: Wal,
    state: MaterializedState,
}

pub struct JobStore {
    inner: Mutex<Inner>,
}

impl JobStore {
    /// Opens the store's WAL at `wal_path`, replaying every entry into a
    /// fresh `MaterializedState` before returning.
    pub fn open(wal_path: impl AsRef<Path>) -> StorageResult<Self> {
        let mut wal = Wal::open(wal_path, 0)?;
        let mut state = MaterializedState::default();
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }
        Ok(Self {
            inner: Mutex::new(Inner { wal, state }),
        })
    }

    fn append_and_apply(&self, event: Event) -> StorageResult<()> {
        let mut inner = self.inner.lock();
        let seq = inner.wal.append(&event)?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        if inner.wal.needs_flush() {
            inner.wal.flush()?;
        }
        Ok(())
    }

    pub fn flush(&self) -> StorageResult<()> {
        self.inner.lock().wal.flush()
    }

    // ---- jobs ----

    pub fn create_job(
        &self,
        kind: JobKind,
        correlation_id: CorrelationId,
        config: Json,
        now: DateTime<Utc>,
    ) -> StorageResult<Job> {
        let mut inner = self.inner.lock();
        let job = Job::new(kind, correlation_id.clone(), config.clone(), now);
        let event = Event::JobCreated {
            job_id: job.id,
            kind,
            correlation_id,
            config,
            created_at: now,
        };
        let seq = inner.wal.append(&event)?;
        inner.state.apply_event(&event);
        inner.wal.mark_processed(seq);
        Ok(job)
    }

    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.inner.lock().state.jobs.get(job_id).cloned()
    }

    pub fn list_jobs(&self) -> Vec<Job> {
        self.inner.lock().state.jobs.values().cloned().collect()
    }

    pub fn start_job(&self, job_id: JobId, now: DateTime<Utc>) -> StorageResult<()> {
        self.append_and_apply(Event::JobStarted {
            job_id,
            started_at: now,
        })
    }

    pub fn record_progress(
        &self,
        job_id: JobId,
        progress_pct: f64,
        current_step: u64,
        total_steps: u64,
    ) -> StorageResult<()> {
        self.append_and_apply(Event::JobProgressRecorded {
            job_id,
            progress_pct,
            current_step,
            total_steps,
        })
    }

    pub fn complete_job(
        &self,
        job_id: JobId,
        artifact_path: Option<String>,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.append_and_apply(Event::JobCompleted {
            job_id,
            artifact_path,
            ended_at: now,
        })
    }

    pub fn fail_job(
        &self,
        job_id: JobId,
        error_type: impl Into<String>,
        error_message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.append_and_apply(Event::JobFailed {
            job_id,
            error_type: error_type.into(),
            error_message: error_message.into(),
            ended_at: now,
        })
    }

    pub fn cancel_job(&self, job_id: JobId, now: DateTime<Utc>) -> StorageResult<()> {
        self.append_and_apply(Event::JobCancelled {
            job_id,
            ended_at: now,
        })
    }

    /// Requeues a failed job for a retryable-error retry. Returns an error
    /// if the job isn't currently `Failed`.
    pub fn retry_job(&self, job_id: JobId) -> StorageResult<()> {
        let retry_count = {
            let inner = self.inner.lock();
            let job = inner
                .state
                .jobs
                .get(job_id.as_str())
                .ok_or_else(|| StorageError::JobNotFound(job_id.to_string()))?;
            if job.status != oj_core::JobStatus::Failed {
                return Err(StorageError::AlreadyTerminal {
                    job_id: job_id.to_string(),
                    action: "retry (job is not in Failed status)",
                });
            }
            job.retry_count + 1
        };
        self.append_and_apply(Event::JobRetried {
            job_id,
            retry_count,
        })
    }

    // ---- queue ----

    pub fn enqueue(
        &self,
        job_id: JobId,
        correlation_id: CorrelationId,
        now: DateTime<Utc>,
    ) -> StorageResult<String> {
        let item_id = format!("q-{}", job_id.as_str());
        self.append_and_apply(Event::QueuePushed {
            item_id: item_id.clone(),
            job_id,
            correlation_id,
            enqueued_at: now,
        })?;
        Ok(item_id)
    }

    /// Leases the oldest pending item, if any, marking it `Leased`.
    pub fn lease_next(&self, now: DateTime<Utc>) -> StorageResult<Option<QueueItem>> {
        let candidate = {
            let inner = self.inner.lock();
            inner
                .state
                .queue
                .iter()
                .find(|i| i.status == QueueItemStatus::Pending)
                .map(|i| i.id.clone())
        };
        let Some(item_id) = candidate else {
            return Ok(None);
        };
        self.append_and_apply(Event::QueueLeased {
            item_id: item_id.clone(),
            leased_at: now,
        })?;
        Ok(self
            .inner
            .lock()
            .state
            .queue
            .iter()
            .find(|i| i.id == item_id)
            .cloned())
    }

    pub fn ack(&self, item_id: impl Into<String>) -> StorageResult<()> {
        self.append_and_apply(Event::QueueAcked {
            item_id: item_id.into(),
        })
    }

    pub fn nack(&self, item_id: impl Into<String>) -> StorageResult<()> {
        self.append_and_apply(Event::QueueNacked {
            item_id: item_id.into(),
        })
    }

    pub fn dead_letter(&self, item_id: impl Into<String>) -> StorageResult<()> {
        self.append_and_apply(Event::QueueDead {
            item_id: item_id.into(),
        })
    }

    /// Items leased longer ago than `visibility_timeout`, for the
    /// redelivery sweep (spec §4.3: a crashed worker leaves the envelope
    /// visible for redelivery after the timeout).
    pub fn expired_leases(
        &self,
        now: DateTime<Utc>,
        visibility_timeout: chrono::Duration,
    ) -> Vec<QueueItem> {
        self.inner
            .lock()
            .state
            .queue
            .iter()
            .filter(|i| {
                i.status == QueueItemStatus::Leased
                    && i.leased_at
                        .map(|leased_at| now - leased_at >= visibility_timeout)
                        .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
