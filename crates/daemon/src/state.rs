// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared HTTP handler state (spec §6), grounded on the donor pack's axum
//! `HttpState` convention: one `Clone` struct wrapping everything a
//! handler needs behind `Arc`, installed once via `.with_state`.

use oj_core::{JobKind, Plugin};
use oj_engine::{Config, EventBus, Executor};
use oj_storage::JobStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JobStore>,
    pub bus: Arc<EventBus>,
    pub executor: Arc<Executor>,
    pub plugins: Arc<HashMap<JobKind, Arc<dyn Plugin>>>,
    pub config: Arc<Config>,
    pub started_at: Instant,
    /// Broadcasts `true` once the daemon begins graceful shutdown, so a
    /// long-lived SSE stream can emit a final `error=server.shutdown`
    /// event before its connection is torn down (spec §4.6).
    pub shutdown: tokio::sync::watch::Receiver<bool>,
}
