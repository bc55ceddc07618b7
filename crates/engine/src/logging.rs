// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide structured logging setup (spec §4.1 ambient stack): an
//! `EnvFilter`-gated `tracing_subscriber::fmt` JSON layer whose writer is
//! wrapped in a redacting `MakeWriter`, backed by `tracing-appender`'s
//! `non_blocking` writer so formatting and I/O never land on the async
//! executor's hot path. Rotation (`latest/` -> `archive/{timestamp}/`) is
//! a directory rename performed once at startup, since the built-in
//! rolling file appender only rotates by calendar boundary, not by
//! process lifetime.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::redaction::Redactor;

/// Holds the `tracing-appender` worker thread's guard; the caller must
/// keep this alive for the process lifetime or buffered log lines are
/// lost on drop.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Moves `log_dir/latest` to `log_dir/archive/{rfc3339-ish timestamp}` if
/// it exists and is non-empty, so each process run starts from a clean
/// `latest` directory. `now` is injected by the caller (process start
/// time) rather than read internally, keeping this function free of
/// hidden clock access.
pub fn rotate_latest(log_dir: &Path, now: chrono::DateTime<chrono::Utc>) -> io::Result<()> {
    let latest = log_dir.join("latest");
    if !latest.exists() {
        return Ok(());
    }
    let has_entries = std::fs::read_dir(&latest)?.next().is_some();
    if !has_entries {
        return Ok(());
    }
    let archive_dir = log_dir.join("archive");
    std::fs::create_dir_all(&archive_dir)?;
    let stamp = now.format("%Y%m%dT%H%M%S%.3fZ").to_string();
    let dest = archive_dir.join(stamp);
    std::fs::rename(&latest, &dest)?;
    std::fs::create_dir_all(&latest)?;
    Ok(())
}

/// A `MakeWriter` that redacts every line a formatter writes before it
/// reaches the underlying sink. `tracing_subscriber::fmt`'s JSON
/// formatter writes one complete JSON object per `write_all` call, so
/// redacting at this layer (rather than per-field in a custom
/// `FormatEvent`) catches the entire serialized line, field names
/// included.
#[derive(Clone)]
pub struct RedactingMakeWriter<W> {
    inner: W,
    redactor: Arc<Redactor>,
}

impl<W> RedactingMakeWriter<W> {
    pub fn new(inner: W, redactor: Arc<Redactor>) -> Self {
        Self { inner, redactor }
    }
}

impl<'a, W> MakeWriter<'a> for RedactingMakeWriter<W>
where
    W: MakeWriter<'a>,
{
    type Writer = RedactingWriter<W::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            redactor: self.redactor.clone(),
        }
    }
}

pub struct RedactingWriter<W> {
    inner: W,
    redactor: Arc<Redactor>,
}

impl<W: io::Write> io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text = String::from_utf8_lossy(buf);
        let redacted = redact_json_line(&self.redactor, &text);
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Redacts a single formatted log line. `tracing_subscriber`'s JSON
/// formatter emits one self-contained JSON object per call; lines that
/// fail to parse (should not happen with the `json` feature, but this
/// must never panic the logging path) pass through with only the
/// string-pattern redaction applied to the raw text.
fn redact_json_line(redactor: &Redactor, line: &str) -> String {
    let trimmed = line.trim_end_matches('\n');
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => {
            let redacted = redactor.redact_value(&value);
            match serde_json::to_string(&redacted) {
                Ok(mut s) => {
                    s.push('\n');
                    s
                }
                Err(_) => format!("{}\n", redactor.redact_str(trimmed)),
            }
        }
        Err(_) => format!("{}\n", redactor.redact_str(trimmed)),
    }
}

/// Initializes the global `tracing` subscriber: an `EnvFilter` seeded
/// from `RUST_LOG` (falling back to `log_level`), a JSON-formatting
/// layer writing to stdout, and a second JSON-formatting layer writing
/// to `{log_dir}/latest/service.jsonl` via a non-blocking, redacting
/// writer. Call once at process startup; returns a guard that must be
/// held for the process lifetime.
pub fn init(log_dir: &Path, log_level: &str) -> io::Result<LoggingGuard> {
    let redactor = Arc::new(Redactor::new());
    let latest_dir = log_dir.join("latest");
    std::fs::create_dir_all(&latest_dir)?;

    let file_appender = tracing_appender::rolling::never(&latest_dir, "service.jsonl");
    let (non_blocking, file_guard) = NonBlocking::new(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(RedactingMakeWriter::new(io::stdout, redactor.clone()));
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(RedactingMakeWriter::new(non_blocking, redactor));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

pub fn latest_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join("latest").join("service.jsonl")
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
