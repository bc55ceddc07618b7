// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived from WAL replay.

mod jobs;
mod queue;

pub use queue::{QueueItem, QueueItemStatus};

use oj_core::Job;
use std::collections::HashMap;

use crate::Event;

/// In-memory projection rebuilt from the WAL on startup and kept in sync
/// by applying each new event as it's appended (spec §4.3).
///
/// # Idempotency
///
/// Every event handler here must be safe to apply twice: once for
/// immediate read-after-write visibility when the store appends an
/// event, and again when the WAL is replayed after a restart. `Job`'s
/// state-machine methods already refuse illegal transitions, so
/// re-applying a terminal event is a no-op rather than a double effect.
#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub jobs: HashMap<String, Job>,
    pub queue: Vec<QueueItem>,
}

impl MaterializedState {
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JobCreated { .. }
            | Event::JobStarted { .. }
            | Event::JobProgressRecorded { .. }
            | Event::JobCompleted { .. }
            | Event::JobFailed { .. }
            | Event::JobCancelled { .. }
            | Event::JobRetried { .. } => jobs::apply(self, event),

            Event::QueuePushed { .. }
            | Event::QueueLeased { .. }
            | Event::QueueAcked { .. }
            | Event::QueueNacked { .. }
            | Event::QueueDead { .. } => queue::apply(self, event),

            Event::Shutdown => {}
        }
    }
}

#[cfg(test)]
#[path = "../state_tests.rs"]
mod tests;
