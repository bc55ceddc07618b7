// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] oj_storage::StorageError),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("job {0} not found")]
    JobNotFound(String),

    #[error("plugin unavailable for backend {0}")]
    PluginUnavailable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
