// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Router assembly and the correlation-id middleware (spec §4.2/§6).

pub mod artifacts;
pub mod bundle;
pub mod health;
pub mod jobs;
pub mod log_file;
pub mod logs;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use oj_core::CorrelationId;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Builds the full `/api` router, wiring the correlation-id middleware
/// around every route so every response carries `X-Correlation-ID` (spec
/// §4.2, §6's "all responses include X-Correlation-ID").
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/training", post(jobs::create_training).get(jobs::list_training))
        .route("/training/:id", get(jobs::get_training))
        .route("/training/:id/cancel", post(jobs::cancel_training))
        .route("/generation", post(jobs::create_generation).get(jobs::list_generation))
        .route("/generation/:id", get(jobs::get_generation))
        .route("/generation/:id/cancel", post(jobs::cancel_generation))
        .route("/jobs/:id/stream", get(stream::stream_job))
        .route("/jobs/:id/logs", get(logs::download_logs))
        .route("/jobs/:id/logs/view", get(logs::view_logs))
        .route("/jobs/:id/artifacts", get(artifacts::list_artifacts))
        .route("/jobs/:id/debug-bundle", get(bundle::debug_bundle))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/info", get(health::info));

    Router::new()
        .nest("/api", api)
        .with_state(Arc::new(state))
        .layer(middleware::from_fn(correlation_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Reads `X-Correlation-ID` off the request, validates it, falls back to a
/// freshly generated `api-{12 hex}` id otherwise, runs the rest of the
/// pipeline inside [`oj_engine::correlation::scope`], and echoes the id
/// back on every response (spec §4.2, restored on worker dequeue the same
/// way; generated here on arrival).
async fn correlation_middleware(request: Request<Body>, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(CorrelationId::from_header_value)
        .unwrap_or_else(CorrelationId::generate_api);

    let mut response = oj_engine::correlation::scope(correlation_id, next.run(request)).await;
    if let Ok(value) = HeaderValue::from_str(correlation_id.as_str()) {
        response.headers_mut().insert("x-correlation-id", value);
    }
    response
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
