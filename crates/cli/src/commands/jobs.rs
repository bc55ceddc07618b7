// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oj jobs list` / `oj jobs show`: read-only inspection of the job store,
//! supplemental to the mandatory `bundle` subcommand (spec §6).

use anyhow::{Context, Result};
use clap::Subcommand;
use oj_core::{Job, JobStatus};

use super::wal_path;

#[derive(Subcommand)]
pub enum JobsCommand {
    /// List jobs, most recent first.
    List {
        /// Only show jobs in this status (queued, running, completed, failed, cancelled).
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of jobs to show.
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Show one job's full record.
    Show {
        job_id: String,

        /// Print as JSON instead of a formatted summary.
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cmd: JobsCommand) -> Result<()> {
    let store = oj_storage::JobStore::open(wal_path()).context("opening job store")?;
    match cmd {
        JobsCommand::List { status, limit } => list(&store, status.as_deref(), limit),
        JobsCommand::Show { job_id, json } => show(&store, &job_id, json),
    }
}

fn list(store: &oj_storage::JobStore, status: Option<&str>, limit: usize) -> Result<()> {
    let wanted = status.map(parse_status).transpose()?;

    let mut jobs = store.list_jobs();
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let jobs = jobs
        .into_iter()
        .filter(|job| wanted.map(|s| job.status == s).unwrap_or(true))
        .take(limit);

    for job in jobs {
        println!(
            "{:<24} {:<10} {:<9} {:>6.1}%  {}",
            job.id.as_str(),
            job.kind,
            job.status,
            job.progress_pct,
            job.created_at.to_rfc3339(),
        );
    }
    Ok(())
}

fn show(store: &oj_storage::JobStore, job_id: &str, json: bool) -> Result<()> {
    let job = store
        .get_job(job_id)
        .with_context(|| format!("job {job_id} not found"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
        return Ok(());
    }

    print_job(&job);
    Ok(())
}

fn print_job(job: &Job) {
    println!("id:            {}", job.id);
    println!("kind:          {}", job.kind);
    println!("status:        {}", job.status);
    println!("correlation:   {}", job.correlation_id);
    println!("progress:      {:.1}% (step {}/{})", job.progress_pct, job.current_step, job.total_steps);
    println!("created_at:    {}", job.created_at.to_rfc3339());
    if let Some(started) = job.started_at {
        println!("started_at:    {}", started.to_rfc3339());
    }
    if let Some(ended) = job.ended_at {
        println!("ended_at:      {}", ended.to_rfc3339());
    }
    if let Some(artifact) = &job.artifact_path {
        println!("artifact_path: {artifact}");
    }
    if let Some(error_type) = &job.error_type {
        println!("error_type:    {error_type}");
    }
    if let Some(error_message) = &job.error_message {
        println!("error_message: {error_message}");
    }
    if job.retry_count > 0 {
        println!("retry_count:   {}", job.retry_count);
    }
}

fn parse_status(raw: &str) -> Result<JobStatus> {
    match raw.to_ascii_lowercase().as_str() {
        "queued" => Ok(JobStatus::Queued),
        "running" => Ok(JobStatus::Running),
        "completed" => Ok(JobStatus::Completed),
        "failed" => Ok(JobStatus::Failed),
        "cancelled" | "canceled" => Ok(JobStatus::Cancelled),
        other => anyhow::bail!("unknown status: {other}"),
    }
}
