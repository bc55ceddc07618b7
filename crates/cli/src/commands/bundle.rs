// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj bundle` (spec §6): assembles the same debug-bundle ZIP the daemon's
//! `GET /jobs/{id}/debug-bundle` endpoint serves, using `oj_engine::bundle`
//! directly so the two never drift apart.

use anyhow::{bail, Context, Result};
use clap::Args;
use oj_core::LogLevel;
use std::path::PathBuf;

use super::wal_path;

#[derive(Args)]
pub struct BundleArgs {
    /// Job id, e.g. `train-...` or `gen-...`.
    pub job_id: String,

    /// Destination path for the archive. Defaults to `{job_id}-debug-bundle.zip`
    /// in the current directory.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: BundleArgs) -> Result<()> {
    if !oj_core::is_path_safe_job_id(&args.job_id) {
        bail!("invalid job id: {}", args.job_id);
    }

    let store = oj_storage::JobStore::open(wal_path()).context("opening job store")?;
    let job = store
        .get_job(&args.job_id)
        .with_context(|| format!("job {} not found", args.job_id))?;

    let config = oj_engine::Config::load().context("loading configuration")?;
    let capabilities = Vec::new();
    let bytes = oj_engine::build_debug_bundle(
        &config.volume_root,
        &config.log_dir,
        &config.mode,
        &job,
        &capabilities,
    )
    .context("assembling debug bundle")?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}-debug-bundle.zip", args.job_id)));
    std::fs::write(&output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    println!("wrote {}", output.display());

    let events = oj_engine::bundle::read_events(&config.volume_root, &args.job_id);
    if let Some(first_error) = events.iter().find(|e| e.level == LogLevel::Error) {
        println!("first error: [{}] {}", first_error.event, first_error.msg);
    }

    Ok(())
}
