// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact records (spec §3 `Artifact`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Sample,
    Checkpoint,
    Output,
}

crate::simple_display! {
    ArtifactType {
        Sample => "sample",
        Checkpoint => "checkpoint",
        Output => "output",
    }
}

/// A file produced by a job, as listed by `GET /jobs/{id}/artifacts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    pub path: String,
    pub url: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
}

/// Parses the step number out of a sample filename following the
/// `step_{NNNNN}.{ext}` discipline (spec §4.5). Returns `None` for any
/// name that doesn't match, in which case the caller still lists the file
/// with `step = null`.
pub fn step_from_sample_filename(file_name: &str) -> Option<u32> {
    let stem = file_name.split('.').next()?;
    let digits = stem.strip_prefix("step_")?;
    if digits.len() != 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
