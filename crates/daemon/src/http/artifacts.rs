// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /jobs/{id}/artifacts` (spec §4.6): enumerates a job's sample
//! directory and any produced checkpoint/output artifacts.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use oj_core::{is_path_safe_job_id, step_from_sample_filename, Artifact, ArtifactType, JobKind};
use std::fs;
use std::path::Path as FsPath;
use std::sync::Arc;

use super::log_file;
use crate::error::ApiError;
use crate::state::AppState;

fn modified_at(metadata: &fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

fn list_samples(job_id: &str, dir: &FsPath) -> Vec<Artifact> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        return Vec::new();
    };
    read_dir
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let name = entry.file_name().into_string().ok()?;
            let step = step_from_sample_filename(&name);
            Some(Artifact {
                name: name.clone(),
                kind: ArtifactType::Sample,
                path: format!("logs/jobs/{job_id}/samples/{name}"),
                url: format!("/api/jobs/{job_id}/artifacts/samples/{name}"),
                size_bytes: metadata.len(),
                created_at: modified_at(&metadata),
                step,
            })
        })
        .collect()
}

fn list_job_artifact(volume_root: &FsPath, job: &oj_core::Job) -> Vec<Artifact> {
    let Some(artifact_path) = &job.artifact_path else {
        return Vec::new();
    };
    let full_path = volume_root.join(artifact_path);
    let Ok(metadata) = fs::metadata(&full_path) else {
        return Vec::new();
    };
    let kind = if job.kind == JobKind::Training {
        ArtifactType::Checkpoint
    } else {
        ArtifactType::Output
    };
    let name = full_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(artifact_path)
        .to_string();
    vec![Artifact {
        name,
        kind,
        path: artifact_path.clone(),
        url: format!("/api/jobs/{}/artifacts/output", job.id),
        size_bytes: metadata.len(),
        created_at: modified_at(&metadata),
        step: None,
    }]
}

pub async fn list_artifacts(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_path_safe_job_id(&id) {
        return Err(ApiError::InvalidJobId);
    }
    let job = state.store.get_job(&id).ok_or_else(|| ApiError::JobNotFound(id.clone()))?;

    let mut artifacts = list_samples(&id, &log_file::samples_dir(&state.config.volume_root, &id));
    artifacts.extend(list_job_artifact(&state.config.volume_root, &job));
    Ok(Json(artifacts))
}

#[cfg(test)]
#[path = "artifacts_tests.rs"]
mod tests;
