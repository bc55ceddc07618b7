// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of internal [`Event`]s, replayed into a
//! [`crate::state::MaterializedState`] on startup. Tolerant of a torn or
//! binary-garbage tail: `open` rotates the offending bytes into a `.bak`
//! file (keeping up to three generations) and keeps whatever valid
//! entries preceded the corruption.

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::StorageResult;
use crate::Event;

const FLUSH_THRESHOLD: usize = 100;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);
const MAX_BAK_GENERATIONS: u8 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

pub struct Wal {
    path: PathBuf,
    file: File,
    write_seq: u64,
    processed_seq: u64,
    read_offset: usize,
    pending_writes: usize,
    last_flush: Instant,
}

fn canonical_line(entry: &WalEntry) -> StorageResult<String> {
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    Ok(line)
}

/// Parses the longest valid prefix of `raw` as newline-delimited
/// `WalEntry` JSON. Returns the parsed entries and whether a corrupt or
/// non-UTF-8 line was encountered (and therefore dropped).
fn parse_valid_prefix(raw: &[u8]) -> (Vec<WalEntry>, bool) {
    let mut entries = Vec::new();
    let mut corrupted = false;
    let mut start = 0usize;
    while start < raw.len() {
        let rel_nl = raw[start..].iter().position(|&b| b == b'\n');
        let (line, next_start) = match rel_nl {
            Some(pos) => (&raw[start..start + pos], start + pos + 1),
            None => (&raw[start..], raw.len()),
        };
        if line.is_empty() {
            start = next_start;
            continue;
        }
        match std::str::from_utf8(line)
            .ok()
            .and_then(|s| serde_json::from_str::<WalEntry>(s).ok())
        {
            Some(entry) => {
                entries.push(entry);
                start = next_start;
            }
            None => {
                corrupted = true;
                break;
            }
        }
    }
    (entries, corrupted)
}

fn rotate_bak_files(path: &Path) -> std::io::Result<()> {
    for gen in (1..MAX_BAK_GENERATIONS).rev() {
        let from = if gen == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{gen}"))
        };
        let to = path.with_extension(format!("bak.{}", gen + 1));
        if from.exists() {
            if to.exists() {
                fs::remove_file(&to)?;
            }
            fs::rename(&from, &to)?;
        }
    }
    let bak1 = path.with_extension("bak");
    if bak1.exists() {
        fs::remove_file(&bak1)?;
    }
    fs::rename(path, &bak1)
}

impl Wal {
    /// Opens (creating if absent) the WAL at `path`. `processed_seq` is the
    /// high-water mark recovered from the last snapshot, used to position
    /// the internal read cursor so `next_unprocessed` skips entries the
    /// caller already applied before the restart.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            File::create(&path)?;
        }

        let raw = fs::read(&path)?;
        let (entries, corrupted) = parse_valid_prefix(&raw);

        if corrupted {
            rotate_bak_files(&path)?;
        }

        let mut canonical = String::new();
        let mut entry_lines = Vec::with_capacity(entries.len());
        for entry in &entries {
            let line = canonical_line(entry)?;
            canonical.push_str(&line);
            entry_lines.push(line);
        }
        fs::write(&path, canonical.as_bytes())?;

        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        let mut read_offset = 0usize;
        for (entry, line) in entries.iter().zip(entry_lines.iter()) {
            if entry.seq <= processed_seq {
                read_offset += line.len();
            } else {
                break;
            }
        }

        let file = OpenOptions::new().append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            write_seq,
            processed_seq,
            read_offset,
            pending_writes: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn append(&mut self, event: &Event) -> StorageResult<u64> {
        let seq = self.write_seq + 1;
        let entry = WalEntry {
            seq,
            event: event.clone(),
        };
        let line = canonical_line(&entry)?;
        self.file.write_all(line.as_bytes())?;
        self.write_seq = seq;
        self.pending_writes += 1;
        Ok(seq)
    }

    pub fn flush(&mut self) -> StorageResult<()> {
        self.file.flush()?;
        self.file.sync_data()?;
        self.pending_writes = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn needs_flush(&self) -> bool {
        self.pending_writes >= FLUSH_THRESHOLD
            || (self.pending_writes > 0 && self.last_flush.elapsed() >= FLUSH_INTERVAL)
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Reads and advances past the next entry, in file order. Returns
    /// `Ok(None)` both at end-of-file and when the next line is corrupt —
    /// in the latter case the cursor still advances past it, so the
    /// caller can keep polling and will pick back up at the next valid
    /// line.
    pub fn next_unprocessed(&mut self) -> StorageResult<Option<WalEntry>> {
        let raw = fs::read(&self.path)?;
        if self.read_offset >= raw.len() {
            return Ok(None);
        }
        let rest = &raw[self.read_offset..];
        let rel_nl = rest.iter().position(|&b| b == b'\n');
        let (line, consumed) = match rel_nl {
            Some(pos) => (&rest[..pos], pos + 1),
            None => (rest, rest.len()),
        };
        self.read_offset += consumed;
        if line.is_empty() {
            return self.next_unprocessed();
        }
        match std::str::from_utf8(line)
            .ok()
            .and_then(|s| serde_json::from_str::<WalEntry>(s).ok())
        {
            Some(entry) => Ok(Some(entry)),
            None => Ok(None),
        }
    }

    /// All cleanly-parsed entries with `seq > after`, stopping at the
    /// first corrupt or non-UTF-8 line encountered.
    pub fn entries_after(&self, after: u64) -> StorageResult<Vec<WalEntry>> {
        let raw = fs::read(&self.path)?;
        let (entries, _corrupted) = parse_valid_prefix(&raw);
        Ok(entries.into_iter().filter(|e| e.seq > after).collect())
    }

    /// Drops entries with `seq < keep_from` from the on-disk log, e.g.
    /// after a snapshot makes them redundant for recovery.
    pub fn truncate_before(&mut self, keep_from: u64) -> StorageResult<()> {
        let raw = fs::read(&self.path)?;
        let (entries, _corrupted) = parse_valid_prefix(&raw);
        let kept: Vec<WalEntry> = entries.into_iter().filter(|e| e.seq >= keep_from).collect();

        let mut canonical = String::new();
        let mut entry_lines = Vec::with_capacity(kept.len());
        for entry in &kept {
            let line = canonical_line(entry)?;
            canonical.push_str(&line);
            entry_lines.push(line);
        }
        fs::write(&self.path, canonical.as_bytes())?;

        let mut read_offset = 0usize;
        for (entry, line) in kept.iter().zip(entry_lines.iter()) {
            if entry.seq <= self.processed_seq {
                read_offset += line.len();
            } else {
                break;
            }
        }
        self.read_offset = read_offset;
        self.file = OpenOptions::new().append(true).open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
