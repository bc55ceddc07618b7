// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /health`, `/ready`, `/info` (spec §6).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// The daemon is ready once every configured backend has a wired plugin;
/// an unwired backend (see `PluginCapabilities::wired`) would accept jobs
/// it can never execute.
pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let unwired: Vec<_> = state
        .plugins
        .values()
        .map(|p| p.capabilities())
        .filter(|c| !c.wired)
        .map(|c| c.backend)
        .collect();

    if unwired.is_empty() {
        (StatusCode::OK, Json(json!({"status": "ready"})))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "not_ready", "unwired_backends": unwired})),
        )
    }
}

pub async fn info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let capabilities: Vec<_> = state.plugins.values().map(|p| p.capabilities()).collect();
    Json(json!({
        "mode": state.config.mode,
        "capabilities": capabilities,
    }))
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
