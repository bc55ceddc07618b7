// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug-bundle ZIP assembly (spec §4.6), shared by the API's
//! `GET /jobs/{id}/debug-bundle` handler and the CLI's `bundle` subcommand
//! so both produce byte-identical output for the same job.

use chrono::Utc;
use oj_core::{Job, JobLogEntry, PluginCapabilities};
use std::io::{self, Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::redaction::Redactor;

const SERVICE_LOG_TAIL_LINES: usize = 1000;

pub fn events_path(volume_root: &Path, job_id: &str) -> std::path::PathBuf {
    volume_root.join("logs/jobs").join(job_id).join("events.jsonl")
}

pub fn samples_dir(volume_root: &Path, job_id: &str) -> std::path::PathBuf {
    volume_root.join("logs/jobs").join(job_id).join("samples")
}

/// Reads every well-formed `JobLogEntry` line from a job's event log,
/// silently skipping malformed ones (spec §4.6).
pub fn read_events(volume_root: &Path, job_id: &str) -> Vec<JobLogEntry> {
    let path = events_path(volume_root, job_id);
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Vec::new();
    };
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

/// Reads `{log_dir}/{service}/latest/{service}.log`'s last
/// `SERVICE_LOG_TAIL_LINES` lines, keeping only the ones mentioning
/// `correlation_id` (the unfiltered log spans every job a process has
/// handled).
fn filtered_service_log(log_dir: &Path, service: &str, correlation_id: &str) -> String {
    let path = log_dir.join(service).join("latest").join(format!("{service}.log"));
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return String::new();
    };
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines.len().saturating_sub(SERVICE_LOG_TAIL_LINES);
    lines[start..]
        .iter()
        .filter(|line| line.contains(correlation_id))
        .map(|line| format!("{line}\n"))
        .collect()
}

/// Assembles the bundle entirely in memory. A pure function of the job's
/// persisted state plus the process's declared plugin capabilities, so
/// two bundles for the same terminal job are byte-equal except for
/// `README.txt`'s `generated_at` line (spec §8's idempotence law).
pub fn build(
    volume_root: &Path,
    log_dir: &Path,
    mode: &str,
    job: &Job,
    capabilities: &[PluginCapabilities],
) -> io::Result<Vec<u8>> {
    let redactor = Redactor::new();
    let job_id = job.id.as_str();

    let mut buf = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buf);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file(format!("{job_id}/README.txt"), options)?;
    write!(
        zip,
        "Debug bundle for job {job_id}\ngenerated_at: {}\nstatus: {}\n\n\
         This archive contains the job's configuration, event log, service-log \
         excerpts, and any samples written during the run. All fields have been \
         passed through redaction before being written to this archive.\n",
        Utc::now().to_rfc3339(),
        job.status,
    )?;

    zip.start_file(format!("{job_id}/metadata.json"), options)?;
    let metadata = redactor.redact_value(&serde_json::to_value(job).unwrap_or_default());
    zip.write_all(serde_json::to_string_pretty(&metadata).unwrap_or_default().as_bytes())?;

    zip.start_file(format!("{job_id}/events.jsonl"), options)?;
    for entry in read_events(volume_root, job_id) {
        let redacted = redactor.redact_value(&serde_json::to_value(&entry).unwrap_or_default());
        zip.write_all(serde_json::to_string(&redacted).unwrap_or_default().as_bytes())?;
        zip.write_all(b"\n")?;
    }

    zip.start_file(format!("{job_id}/environment.json"), options)?;
    let environment = serde_json::json!({
        "mode": mode,
        "backends": capabilities,
    });
    zip.write_all(serde_json::to_string_pretty(&environment).unwrap_or_default().as_bytes())?;

    let correlation_id = job.correlation_id.to_string();
    for service in ["api", "worker"] {
        zip.start_file(format!("{job_id}/service_logs/{service}.log"), options)?;
        let filtered = filtered_service_log(log_dir, service, &correlation_id);
        zip.write_all(redactor.redact_str(&filtered).as_bytes())?;
    }

    let samples = samples_dir(volume_root, job_id);
    if let Ok(read_dir) = std::fs::read_dir(&samples) {
        for entry in read_dir.filter_map(|e| e.ok()) {
            if !entry.metadata().map(|m| m.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(name) = entry.file_name().into_string().ok() else {
                continue;
            };
            zip.start_file(format!("{job_id}/samples/{name}"), options)?;
            zip.write_all(&std::fs::read(entry.path())?)?;
        }
    }

    zip.finish()?;
    Ok(buf.into_inner())
}

#[cfg(test)]
#[path = "bundle_tests.rs"]
mod tests;
