// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /jobs/{id}/logs` (raw download) and `GET /jobs/{id}/logs/view`
//! (filtered/paginated) per spec §4.6.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use oj_core::{is_path_safe_job_id, JobLogEntry, LogLevel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::log_file;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub entries: Vec<JobLogEntry>,
    pub total: usize,
}

fn require_known_job(state: &AppState, id: &str) -> Result<(), ApiError> {
    if !is_path_safe_job_id(id) {
        return Err(ApiError::InvalidJobId);
    }
    if state.store.get_job(id).is_none() {
        return Err(ApiError::JobNotFound(id.to_string()));
    }
    Ok(())
}

pub async fn download_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_known_job(&state, &id)?;
    let path = log_file::events_path(&state.config.volume_root, &id);
    let body = std::fs::read(&path).unwrap_or_default();
    let headers = [
        (header::CONTENT_TYPE, "application/x-ndjson".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={id}.jsonl"),
        ),
    ];
    Ok((headers, body))
}

pub async fn view_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_known_job(&state, &id)?;
    let path = log_file::events_path(&state.config.volume_root, &id);
    let mut entries = log_file::read_all(&path)?;

    if let Some(level) = query.level.as_deref().and_then(|s| s.parse::<LogLevel>().ok()) {
        entries.retain(|e| e.level == level);
    }
    if let Some(event) = query.event.as_deref() {
        entries.retain(|e| e.event.contains(event));
    }

    let total = entries.len();
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(total);
    let page: Vec<_> = entries.into_iter().skip(offset).take(limit).collect();

    Ok(Json(ViewResponse { entries: page, total }))
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
