// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST`/`GET /training`, `POST`/`GET /generation`, and their `/cancel`
//! endpoints (spec §6).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use oj_core::{is_path_safe_job_id, JobId, JobKind, JobStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTrainingRequest {
    pub character_id: String,
    #[serde(default)]
    pub config: JsonValue,
}

#[derive(Debug, Deserialize)]
pub struct CreateGenerationRequest {
    #[serde(default)]
    pub config: JsonValue,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub id: String,
    pub status: JobStatus,
    pub correlation_id: String,
}

fn correlation_id() -> oj_core::CorrelationId {
    oj_engine::correlation::current().unwrap_or_else(oj_core::CorrelationId::generate_api)
}

/// Validates `config` against the backend's declared capability schema,
/// then enqueues the job. `extra` is merged into the stored config after
/// validation (spec §6's `POST /training` body carries `character_id`
/// alongside `config`, but `Job.config` is a single opaque blob — the
/// submitted config is what's validated, so the merge can never trigger a
/// spurious `UnsupportedConfig`).
async fn create_job(
    state: &AppState,
    kind: JobKind,
    config: JsonValue,
    extra: Vec<(&'static str, JsonValue)>,
) -> Result<CreateJobResponse, ApiError> {
    let plugin = state
        .plugins
        .get(&kind)
        .ok_or_else(|| ApiError::Engine(oj_engine::EngineError::PluginUnavailable(kind.to_string())))?;

    let caps = plugin.capabilities();
    if let Some(parameter) = caps.reject_unsupported(&config) {
        return Err(ApiError::UnsupportedConfig {
            backend: caps.backend.clone(),
            parameter,
            reason: "not declared in this backend's capability schema".to_string(),
        });
    }

    let mut stored_config = config;
    if !stored_config.is_object() {
        stored_config = JsonValue::Object(Default::default());
    }
    let obj = stored_config.as_object_mut().expect("just ensured object");
    for (key, value) in extra {
        obj.insert(key.to_string(), value);
    }

    let correlation_id = correlation_id();
    let now = Utc::now();
    let job = state.store.create_job(kind, correlation_id, stored_config, now)?;
    state.store.enqueue(job.id, correlation_id, now)?;

    Ok(CreateJobResponse {
        id: job.id.to_string(),
        status: job.status,
        correlation_id: correlation_id.to_string(),
    })
}

pub async fn create_training(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTrainingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = create_job(
        &state,
        JobKind::Training,
        body.config,
        vec![("character_id", JsonValue::String(body.character_id))],
    )
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn create_generation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateGenerationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = create_job(&state, JobKind::Generation, body.config, vec![]).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

fn list_by_kind(state: &AppState, kind: JobKind) -> Vec<oj_core::Job> {
    let mut jobs: Vec<_> = state.store.list_jobs().into_iter().filter(|j| j.kind == kind).collect();
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    jobs
}

pub async fn list_training(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(list_by_kind(&state, JobKind::Training))
}

pub async fn list_generation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(list_by_kind(&state, JobKind::Generation))
}

fn get_job(state: &AppState, id: &str) -> Result<oj_core::Job, ApiError> {
    if !is_path_safe_job_id(id) {
        return Err(ApiError::InvalidJobId);
    }
    state.store.get_job(id).ok_or_else(|| ApiError::JobNotFound(id.to_string()))
}

pub async fn get_training(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(get_job(&state, &id)?))
}

pub async fn get_generation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(get_job(&state, &id)?))
}

/// Idempotent job cancellation (spec §6, §8's boundary behaviors): a
/// `queued` job is cancelled directly in the store (the executor never
/// dequeues it); a `running` job's in-memory cancel token is flipped so
/// the plugin observes it within the spec's 100 ms budget, and the store
/// transition happens once the executor's `execute` loop finishes.
async fn cancel_job(state: &AppState, id: &str) -> Result<(), ApiError> {
    let job = get_job(state, id)?;
    let job_id = JobId::from_string(id);
    match job.status {
        JobStatus::Queued => {
            state.store.cancel_job(job_id, Utc::now())?;
        }
        JobStatus::Running => {
            if !state.executor.signal_cancel(id) {
                state.store.cancel_job(job_id, Utc::now())?;
            }
        }
        _ => {}
    }
    Ok(())
}

pub async fn cancel_training(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    cancel_job(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn cancel_generation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    cancel_job(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
