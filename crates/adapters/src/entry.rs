// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for building [`JobLogEntry`] values. Plugins only see a
//! `dyn ProgressSink`, not the richer `JobLogger` the worker process holds,
//! so both backends build entries by hand the same way.

use oj_core::{JobId, JobLogEntry, JobStatus, LogLevel, Stage};

/// A blank entry for `event`/`msg`. `job_id` and `correlation_id` are
/// overwritten by `JobLogger::append` on the receiving end, so any
/// placeholder value here is fine; it's set anyway for readability when
/// these entries are inspected directly (e.g. in tests).
pub fn blank(job_id: JobId, event: impl Into<String>, msg: impl Into<String>) -> JobLogEntry {
    JobLogEntry {
        ts: chrono::Utc::now(),
        level: LogLevel::Info,
        service: "worker".to_string(),
        job_id,
        event: event.into(),
        msg: msg.into(),
        correlation_id: None,
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

#[allow(clippy::too_many_arguments)]
pub fn step(
    job_id: JobId,
    stage: Stage,
    step: u64,
    steps_total: u64,
    progress_pct: f64,
    loss: Option<f64>,
    lr: Option<f64>,
    msg: impl Into<String>,
) -> JobLogEntry {
    let mut entry = blank(job_id, "training.step", msg);
    entry.status = Some(JobStatus::Running);
    entry.stage = Some(stage);
    entry.step = Some(step);
    entry.steps_total = Some(steps_total);
    entry.progress_pct = Some(progress_pct);
    entry.loss = loss;
    entry.lr = lr;
    entry
}

pub fn lifecycle(job_id: JobId, stage: Stage, progress_pct: f64, msg: impl Into<String>) -> JobLogEntry {
    let mut entry = blank(job_id, "training.step", msg);
    entry.status = Some(JobStatus::Running);
    entry.stage = Some(stage);
    entry.progress_pct = Some(progress_pct);
    entry
}

pub fn sample(job_id: JobId, step: u32, path: impl Into<String>) -> JobLogEntry {
    let path = path.into();
    let mut entry = blank(job_id, "training.sample", format!("sample written: {path}"));
    entry.step = Some(step as u64);
    entry.sample_path = Some(path);
    entry
}
