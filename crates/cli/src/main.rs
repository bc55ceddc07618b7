// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj`: a read-only companion to `ojd`. Reads the same on-disk state the
//! daemon writes (the WAL-backed job store and `logs/jobs/{id}/...`) to
//! assemble debug bundles and print job status, without needing the API
//! process to be running.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "oj", version, about = "Odd Jobs CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a job's debug bundle and write it to local disk.
    Bundle(commands::bundle::BundleArgs),
    /// Inspect jobs recorded in the job store.
    #[command(subcommand)]
    Jobs(commands::jobs::JobsCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Bundle(args) => commands::bundle::run(args),
        Command::Jobs(cmd) => commands::jobs::run(cmd),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}
