// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue item records and event handlers.

use chrono::{DateTime, Utc};
use oj_core::{CorrelationId, JobId};
use serde::{Deserialize, Serialize};

use crate::Event;

use super::MaterializedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    Pending,
    Leased,
    Done,
    Dead,
}

/// A job handoff envelope — deliberately thin (spec §4.3): the worker
/// re-reads the full config from the job store, never from the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub job_id: JobId,
    pub correlation_id: CorrelationId,
    pub status: QueueItemStatus,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leased_at: Option<DateTime<Utc>>,
}

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::QueuePushed {
            item_id,
            job_id,
            correlation_id,
            enqueued_at,
        } => {
            if !state.queue.iter().any(|i| &i.id == item_id) {
                state.queue.push(QueueItem {
                    id: item_id.clone(),
                    job_id: job_id.clone(),
                    correlation_id: correlation_id.clone(),
                    status: QueueItemStatus::Pending,
                    enqueued_at: *enqueued_at,
                    leased_at: None,
                });
            }
        }
        Event::QueueLeased { item_id, leased_at } => {
            if let Some(item) = state.queue.iter_mut().find(|i| &i.id == item_id) {
                item.status = QueueItemStatus::Leased;
                item.leased_at = Some(*leased_at);
            }
        }
        Event::QueueAcked { item_id } => {
            if let Some(item) = state.queue.iter_mut().find(|i| &i.id == item_id) {
                item.status = QueueItemStatus::Done;
            }
        }
        Event::QueueNacked { item_id } => {
            if let Some(item) = state.queue.iter_mut().find(|i| &i.id == item_id) {
                item.status = QueueItemStatus::Pending;
                item.leased_at = None;
            }
        }
        Event::QueueDead { item_id } => {
            if let Some(item) = state.queue.iter_mut().find(|i| &i.id == item_id) {
                item.status = QueueItemStatus::Dead;
            }
        }
        _ => {}
    }
}
