// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /jobs/{id}/debug-bundle` (spec §4.6): wraps `oj_engine::bundle`,
//! shared with the CLI's `bundle` subcommand so both produce identical
//! archives for the same job.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use oj_core::is_path_safe_job_id;
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn debug_bundle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_path_safe_job_id(&id) {
        return Err(ApiError::InvalidJobId);
    }
    let job = state.store.get_job(&id).ok_or_else(|| ApiError::JobNotFound(id.clone()))?;
    let capabilities: Vec<_> = state.plugins.values().map(|p| p.capabilities()).collect();
    let bytes = oj_engine::build_debug_bundle(
        &state.config.volume_root,
        &state.config.log_dir,
        &state.config.mode,
        &job,
        &capabilities,
    )?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={id}-debug-bundle.zip"),
        ),
    ];
    Ok((headers, bytes))
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
