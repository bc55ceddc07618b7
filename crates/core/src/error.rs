// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (spec §7).

use thiserror::Error;

/// Validation errors, surfaced as HTTP 400/404 and never logged at ERROR
/// unless they indicate a client contract bug (spec §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported config parameter {parameter:?} for backend {backend:?}: {reason}")]
    UnsupportedParameter {
        backend: String,
        parameter: String,
        reason: String,
    },
    #[error("job not found: {0}")]
    JobNotFound(String),
    #[error("invalid job id: {0}")]
    InvalidJobId(String),
}
