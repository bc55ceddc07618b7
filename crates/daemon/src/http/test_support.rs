// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the `http` module's handler tests: a real
//! `AppState` backed by a temp-dir `JobStore`, wired with the actual
//! (deterministic) `oj-adapters` plugins rather than a mock, since both
//! run in-memory fast enough for unit tests.

#![cfg(test)]

use oj_adapters::{ImageGenerationPlugin, LoraTrainingPlugin};
use oj_core::{JobKind, Plugin};
use oj_engine::{Config, EventBus, Executor};
use oj_storage::JobStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::AppState;

pub struct Fixture {
    pub state: Arc<AppState>,
    pub _tempdir: tempfile::TempDir,
    pub shutdown_tx: tokio::sync::watch::Sender<bool>,
}

pub fn build() -> Fixture {
    let tempdir = tempfile::tempdir().expect("tempdir");
    let volume_root = tempdir.path().to_path_buf();

    let store = Arc::new(JobStore::open(volume_root.join("wal.jsonl")).expect("open store"));
    let bus = Arc::new(EventBus::new());

    let mut plugins: HashMap<JobKind, Arc<dyn Plugin>> = HashMap::new();
    plugins.insert(JobKind::Training, Arc::new(LoraTrainingPlugin::new()));
    plugins.insert(JobKind::Generation, Arc::new(ImageGenerationPlugin::new()));
    let plugins = Arc::new(plugins);

    let config = Config {
        volume_root: volume_root.clone(),
        log_dir: volume_root.join("logs"),
        log_level: "info".to_string(),
        mode: "fast-test".to_string(),
        visibility_timeout: Duration::from_secs(60),
        cancel_deadline: Duration::from_secs(10),
        retry_delay: Duration::from_secs(30),
        retryable_error_types: Default::default(),
        job_timeout: None,
    };

    let executor = Arc::new(Executor::new(store.clone(), bus.clone(), config.clone(), (*plugins).clone()));
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let state = Arc::new(AppState {
        store,
        bus,
        executor,
        plugins,
        config: Arc::new(config),
        started_at: Instant::now(),
        shutdown: shutdown_rx,
    });

    Fixture {
        state,
        _tempdir: tempdir,
        shutdown_tx,
    }
}
