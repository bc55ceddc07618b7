// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /jobs/{id}/stream` (spec §4.6): an SSE endpoint replaying a job's
//! recent history then forwarding the event bus live, with a 15 s
//! heartbeat comment and a final `error=server.shutdown` frame if the
//! daemon shuts down mid-stream.

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use oj_core::{JobStatus, TrainingProgressEvent};
use oj_engine::bus::BusEvent;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::log_file;
use crate::error::ApiError;
use crate::state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const HISTORY_LIMIT: usize = 50;
const CHANNEL_CAPACITY: usize = 32;

fn event_name(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Completed => "complete",
        JobStatus::Failed | JobStatus::Cancelled => "error",
        JobStatus::Queued | JobStatus::Running => "progress",
    }
}

fn progress_event(name: &'static str, progress: &TrainingProgressEvent) -> Event {
    let data = serde_json::to_string(progress).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}

pub async fn stream_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !oj_core::is_path_safe_job_id(&id) {
        return Err(ApiError::InvalidJobId);
    }
    let job = state.store.get_job(&id).ok_or_else(|| ApiError::JobNotFound(id.clone()))?;

    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(CHANNEL_CAPACITY);
    tokio::spawn(run_stream(state, job, tx));

    Ok(Sse::new(ReceiverStream::new(rx)))
}

async fn run_stream(state: Arc<AppState>, job: oj_core::Job, tx: mpsc::Sender<Result<Event, Infallible>>) {
    let job_id = job.id;
    let snapshot = match serde_json::to_string(&job) {
        Ok(body) => Event::default().event("snapshot").data(body),
        Err(_) => return,
    };
    if tx.send(Ok(snapshot)).await.is_err() {
        return;
    }

    let path = log_file::events_path(&state.config.volume_root, job_id.as_str());
    let history = log_file::read_all(&path).unwrap_or_default();
    for entry in log_file::tail(history, HISTORY_LIMIT) {
        let Some(progress) = entry.to_progress_event() else {
            continue;
        };
        let evt = progress_event(event_name(progress.status), &progress);
        if tx.send(Ok(evt)).await.is_err() {
            return;
        }
    }

    if job.status.is_terminal() {
        return;
    }

    let mut subscription = state.bus.subscribe(&job_id);
    let mut shutdown = state.shutdown.clone();
    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    let _ = tx
                        .send(Ok(Event::default()
                            .event("error")
                            .data(r#"{"error":"server shutting down","error_type":"server.shutdown"}"#)))
                        .await;
                    return;
                }
            }
            _ = heartbeat.tick() => {
                if tx.send(Ok(Event::default().comment(""))).await.is_err() {
                    return;
                }
            }
            bus_event = subscription.recv() => {
                match bus_event {
                    BusEvent::Progress(progress) => {
                        let name = event_name(progress.status);
                        let closing = name != "progress";
                        if tx.send(Ok(progress_event(name, &progress))).await.is_err() {
                            return;
                        }
                        if closing {
                            return;
                        }
                    }
                    BusEvent::Lagged(n) => {
                        tracing::warn!(job_id = %job_id, dropped = n, "subscriber.dropped");
                    }
                    BusEvent::Closed => return,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
