// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job event handlers.
//!
//! Every handler here must be idempotent: the same event may be applied
//! twice (once for immediate read-after-write visibility, once again on
//! WAL replay after a restart). `Job`'s own state-machine methods already
//! refuse illegal transitions, so re-applying a terminal event is a
//! harmless no-op rather than a double-counted side effect.

use oj_core::Job;

use crate::Event;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::JobCreated {
            job_id,
            kind,
            correlation_id,
            config,
            created_at,
        } => {
            state.jobs.entry(job_id.as_str().to_string()).or_insert_with(|| {
                Job::new(*kind, correlation_id.clone(), config.clone(), *created_at)
            });
        }
        Event::JobStarted { job_id, started_at } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                let _ = job.start(*started_at);
            }
        }
        Event::JobProgressRecorded {
            job_id,
            progress_pct,
            current_step,
            total_steps,
        } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                job.record_progress(*progress_pct, *current_step, *total_steps);
            }
        }
        Event::JobCompleted {
            job_id,
            artifact_path,
            ended_at,
        } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                let _ = job.complete(artifact_path.clone(), *ended_at);
            }
        }
        Event::JobFailed {
            job_id,
            error_type,
            error_message,
            ended_at,
        } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                let _ = job.fail(error_type.clone(), error_message.clone(), *ended_at);
            }
        }
        Event::JobCancelled { job_id, ended_at } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                let _ = job.cancel(*ended_at);
            }
        }
        Event::JobRetried { job_id, .. } => {
            if let Some(job) = state.jobs.get_mut(job_id.as_str()) {
                let _ = job.retry();
            }
        }
        _ => {}
    }
}
