// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-memory event bus (spec §4.4): a registry of per-job broadcast
//! channels. Generalized from the donor's single process-wide `EventBus`
//! to one `tokio::sync::broadcast` channel per `job_id`, capacity 64, so
//! ordering and backpressure are scoped per job rather than shared across
//! every job the daemon is running.
//!
//! `broadcast`'s ring-buffer semantics are exactly the drop-oldest
//! backpressure the spec asks for: once a lagging receiver's unread count
//! exceeds capacity, its next `recv()` resolves to `Lagged(n)` rather than
//! blocking the sender or any other receiver.

use oj_core::{JobId, TrainingProgressEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// What a subscriber observes on a given poll of its channel.
pub enum BusEvent {
    Progress(TrainingProgressEvent),
    /// The receiver fell behind and this many events were dropped from
    /// under it; the caller is expected to log a `subscriber.dropped`
    /// service event and keep forwarding from the current ring position.
    Lagged(u64),
    /// The job's channel has no more senders (the job's logger has been
    /// dropped, e.g. the daemon is shutting down).
    Closed,
}

#[derive(Default)]
pub struct EventBus {
    channels: Mutex<HashMap<String, broadcast::Sender<TrainingProgressEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, job_id: &JobId) -> broadcast::Sender<TrainingProgressEvent> {
        let mut channels = self.channels.lock();
        channels
            .entry(job_id.as_str().to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Publishes an event to every live subscriber of `job_id`. A
    /// `SendError` (no receivers) is not an error condition — it just
    /// means nobody is watching right now.
    pub fn publish(&self, job_id: &JobId, event: TrainingProgressEvent) {
        let _ = self.sender_for(job_id).send(event);
    }

    pub fn subscribe(&self, job_id: &JobId) -> BusSubscription {
        BusSubscription {
            rx: self.sender_for(job_id).subscribe(),
        }
    }

    /// Drops the channel for a job once it reaches a terminal state and
    /// no further events will ever publish, freeing the registry entry.
    pub fn retire(&self, job_id: &JobId) {
        self.channels.lock().remove(job_id.as_str());
    }
}

pub struct BusSubscription {
    rx: broadcast::Receiver<TrainingProgressEvent>,
}

impl BusSubscription {
    pub async fn recv(&mut self) -> BusEvent {
        match self.rx.recv().await {
            Ok(event) => BusEvent::Progress(event),
            Err(broadcast::error::RecvError::Lagged(n)) => BusEvent::Lagged(n),
            Err(broadcast::error::RecvError::Closed) => BusEvent::Closed,
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
