// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ojd`: the API process. Loads configuration, opens the write-ahead-logged
//! job store, wires the two built-in backend plugins, starts the executor's
//! dequeue loop as a background task, and serves the HTTP surface (spec §6)
//! until `SIGINT`/`SIGTERM`, at which point in-flight SSE streams get a
//! final `error=server.shutdown` event before the listener closes.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod error;
mod http;
mod state;

use oj_adapters::{ImageGenerationPlugin, LoraTrainingPlugin};
use oj_core::{JobKind, Plugin};
use oj_engine::{Config, EventBus, Executor};
use oj_storage::JobStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::load()?;

    let _logging_guard = oj_engine::init_logging(&config.log_dir, &config.log_level)?;
    tracing::info!(mode = %config.mode, "starting oj-daemon");

    std::fs::create_dir_all(&config.volume_root)?;
    let wal_path = config.volume_root.join("wal.jsonl");
    let store = Arc::new(JobStore::open(&wal_path)?);
    let bus = Arc::new(EventBus::new());

    let mut plugins: HashMap<JobKind, Arc<dyn Plugin>> = HashMap::new();
    plugins.insert(JobKind::Training, Arc::new(LoraTrainingPlugin::new()));
    plugins.insert(JobKind::Generation, Arc::new(ImageGenerationPlugin::new()));
    let plugins = Arc::new(plugins);

    let executor_plugins = (*plugins).clone();
    let executor = Arc::new(Executor::new(store.clone(), bus.clone(), config.clone(), executor_plugins));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let executor_task = tokio::spawn(executor.clone().serve(shutdown_rx.clone()));

    let app_state = AppState {
        store,
        bus,
        executor,
        plugins,
        config: Arc::new(config),
        started_at: Instant::now(),
        shutdown: shutdown_rx,
    };

    let bind_addr = std::env::var("OJ_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");

    let router = http::build_router(app_state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    executor_task.await.ok();
    Ok(())
}

/// Waits for `ctrl_c` or `SIGTERM`, then broadcasts `true` on the shutdown
/// watch channel before the server future resolves, so an in-flight SSE
/// stream observes the change and emits its `server.shutdown` event first
/// (spec §4.6).
async fn shutdown_signal(shutdown_tx: tokio::sync::watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl_c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received, draining connections");
    let _ = shutdown_tx.send(true);
}
