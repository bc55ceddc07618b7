// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-capacity identifier buffer and the two identifier types built on it:
//! [`JobId`] (`{type}-{12 hex}`) and [`CorrelationId`] (`{prefix}-{12 hex}`).
//!
//! Both shapes are short enough that a heap `String` is wasted allocation
//! churn on the hot path (every log line carries a correlation id); `IdBuf`
//! inlines the bytes instead.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Longest identifier this buffer can hold: `"generation-"` (11) + 12 hex chars.
pub const ID_MAX_LEN: usize = 24;

/// Inline fixed-capacity string for short identifiers.
#[derive(Clone, Copy)]
pub struct IdBuf {
    len: u8,
    buf: [u8; ID_MAX_LEN],
}

impl IdBuf {
    pub fn new(s: &str) -> Self {
        debug_assert!(
            s.len() <= ID_MAX_LEN,
            "identifier {s:?} exceeds IdBuf capacity"
        );
        let mut buf = [0u8; ID_MAX_LEN];
        let len = s.len().min(ID_MAX_LEN);
        buf[..len].copy_from_slice(&s.as_bytes()[..len]);
        Self {
            len: len as u8,
            buf,
        }
    }

    pub fn as_str(&self) -> &str {
        // Safety-free: constructed only from valid UTF-8 `&str` slices.
        std::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PartialEq for IdBuf {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for IdBuf {}

impl std::hash::Hash for IdBuf {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for IdBuf {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for IdBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IdBuf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IdBuf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.len() > ID_MAX_LEN {
            return Err(de::Error::custom(format!(
                "identifier {s:?} exceeds max length {ID_MAX_LEN}"
            )));
        }
        Ok(IdBuf::new(&s))
    }
}

/// Returns 12 lowercase hex characters derived from a fresh random UUID.
fn hex12() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    raw[..12].to_string()
}

/// The kind of job, determining both the `type` field and the `id` prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Training,
    Generation,
}

impl JobKind {
    /// Prefix used in the job id (`train` / `gen`), per spec §3.
    pub fn id_prefix(self) -> &'static str {
        match self {
            JobKind::Training => "train",
            JobKind::Generation => "gen",
        }
    }
}

crate::simple_display! {
    JobKind {
        Training => "training",
        Generation => "generation",
    }
}

/// Unique identifier for a job: `{type}-{12 lowercase hex chars}`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(IdBuf);

impl JobId {
    pub fn new(kind: JobKind) -> Self {
        Self(IdBuf::new(&format!("{}-{}", kind.id_prefix(), hex12())))
    }

    pub fn from_string(s: impl AsRef<str>) -> Self {
        Self(IdBuf::new(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The job kind as recovered from the id's prefix, if recognizable.
    pub fn kind(&self) -> Option<JobKind> {
        if self.0.as_str().starts_with("train-") {
            Some(JobKind::Training)
        } else if self.0.as_str().starts_with("gen-") {
            Some(JobKind::Generation)
        } else {
            None
        }
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}
impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}
impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}
impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

/// Validates a job id is safe to splice into a filesystem path:
/// `^[a-zA-Z0-9_-]+$`, per spec §4.6's path-traversal defense.
pub fn is_path_safe_job_id(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Correlation id prefixes, per spec §4.2.
pub const CORRELATION_PREFIX_FRONTEND: &str = "fe";
pub const CORRELATION_PREFIX_API: &str = "api";
pub const CORRELATION_PREFIX_CLIENT: &str = "cor";

/// A short identifier stamped on a user action and carried through every
/// log line and event it causes: `{prefix}-{12 hex}`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(IdBuf);

impl CorrelationId {
    pub fn generate(prefix: &str) -> Self {
        Self(IdBuf::new(&format!("{prefix}-{}", hex12())))
    }

    pub fn generate_api() -> Self {
        Self::generate(CORRELATION_PREFIX_API)
    }

    pub fn from_string(s: impl AsRef<str>) -> Self {
        Self(IdBuf::new(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Accepts a client-supplied `X-Correlation-ID` header value if it
    /// matches `[A-Za-z0-9_-]{1,64}`, per spec §4.2.
    pub fn from_header_value(value: &str) -> Option<Self> {
        if value.is_empty() || value.len() > 64 {
            return None;
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return None;
        }
        Some(Self(IdBuf::new(value)))
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl Borrow<str> for CorrelationId {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}
impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
