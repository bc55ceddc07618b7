// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A `ProgressSink` double that just records entries, for this crate's own
//! tests and for other crates exercising these plugins under `test-support`.

use async_trait::async_trait;
use oj_core::{JobLogEntry, ProgressSink};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct CollectingSink {
    entries: Arc<Mutex<Vec<JobLogEntry>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<JobLogEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl ProgressSink for CollectingSink {
    async fn log(&self, entry: JobLogEntry) {
        self.entries.lock().push(entry);
    }
}
