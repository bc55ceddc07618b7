// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wal serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("job {job_id} is already terminal, cannot {action}")]
    AlreadyTerminal { job_id: String, action: &'static str },

    #[error("queue item not found: {0}")]
    QueueItemNotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
