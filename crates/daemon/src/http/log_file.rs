// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only access to a job's `events.jsonl`, shared by the SSE, log-view,
//! download, and debug-bundle handlers. Writing is `oj_engine::JobLogger`'s
//! job; this side only ever reads the file the worker appends to.

use oj_core::JobLogEntry;
use std::io::BufRead;
use std::path::Path;

pub use oj_engine::bundle::{events_path, samples_dir};

/// Reads every well-formed line of `path`, skipping malformed ones (spec
/// §4.6: "malformed lines are skipped ... so partial log corruption never
/// blocks a view"). Returns an empty vec for a job with no events yet.
pub fn read_all(path: &Path) -> std::io::Result<Vec<JobLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(entry) = serde_json::from_str::<JobLogEntry>(&line) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

pub fn tail(mut entries: Vec<JobLogEntry>, limit: usize) -> Vec<JobLogEntry> {
    let start = entries.len().saturating_sub(limit);
    entries.split_off(start)
}
