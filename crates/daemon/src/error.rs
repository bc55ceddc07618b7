// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! API-edge error taxonomy (spec §7): validation errors are handled here
//! and never reach the executor.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unsupported config parameter {parameter:?} for backend {backend}: {reason}")]
    UnsupportedConfig {
        backend: String,
        parameter: String,
        reason: String,
    },

    #[error("job {0} not found")]
    JobNotFound(String),

    #[error("invalid job id")]
    InvalidJobId,

    #[error("engine error: {0}")]
    Engine(#[from] oj_engine::EngineError),

    #[error("storage error: {0}")]
    Storage(#[from] oj_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, error_type) = match &self {
            ApiError::UnsupportedConfig { backend, parameter, reason } => (
                StatusCode::BAD_REQUEST,
                format!("unsupported config parameter \"{parameter}\" for backend \"{backend}\": {reason}"),
                "UnsupportedConfig",
            ),
            ApiError::JobNotFound(id) => (StatusCode::NOT_FOUND, format!("job {id} not found"), "JobNotFound"),
            ApiError::InvalidJobId => (StatusCode::BAD_REQUEST, "invalid job id".to_string(), "InvalidJobId"),
            ApiError::Engine(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), "EngineError"),
            ApiError::Storage(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), "StorageError"),
            ApiError::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), "IoError"),
        };
        if status.is_server_error() {
            tracing::error!(error = %error, error_type, "request failed");
        }
        (status, Json(json!({ "error": error, "error_type": error_type }))).into_response()
    }
}
