// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret redaction applied to every log record and observability field
//! before it is written (spec §4.1). Two passes: a key-name pass (replaces
//! the whole value when the key looks sensitive) and a pattern pass
//! (replaces just the matching substring inside a string value).

use regex::Regex;
use serde_json::Value as Json;
use std::collections::HashSet;

pub const MAX_DEPTH_EXCEEDED: &str = "[MAX_DEPTH_EXCEEDED]";
pub const CIRCULAR_REFERENCE: &str = "[CIRCULAR_REFERENCE]";

const MAX_DEPTH: usize = 10;

const SENSITIVE_KEYS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api_key",
    "apikey",
    "token",
    "password",
    "secret",
    "credential",
];

/// Compiled pattern table and key set, built once at construction (spec
/// §4.1's ambient-stack note: explicit construction over hidden statics).
pub struct Redactor {
    patterns: Vec<(Regex, &'static str)>,
    sensitive_keys: HashSet<&'static str>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Redactor {
    pub fn new() -> Self {
        let patterns = vec![
            (Regex::new(r"hf_[A-Za-z0-9]+").unwrap(), "hf_***REDACTED***"),
            (Regex::new(r"sk-[A-Za-z0-9-]+").unwrap(), "sk-***REDACTED***"),
            (Regex::new(r"ghp_[A-Za-z0-9]+").unwrap(), "ghp_***REDACTED***"),
            (Regex::new(r"rpa_[A-Za-z0-9]+").unwrap(), "rpa_***REDACTED***"),
            (
                Regex::new(r"(?i)Bearer [A-Za-z0-9._-]+").unwrap(),
                "Bearer ***REDACTED***",
            ),
            (
                Regex::new(r"(?i)token=[^&\s]+").unwrap(),
                "token=***",
            ),
            (
                Regex::new(r"(?i)password=[^\s&]+").unwrap(),
                "password=***",
            ),
            (Regex::new(r"/Users/[^/]+/").unwrap(), "/[HOME]/"),
        ];
        Self {
            patterns,
            sensitive_keys: SENSITIVE_KEYS.iter().copied().collect(),
        }
    }

    /// Scans a single string against the pattern table, replacing matches
    /// in place (the surrounding text is preserved).
    pub fn redact_str(&self, input: &str) -> String {
        let mut out = input.to_string();
        for (pattern, replacement) in &self.patterns {
            if pattern.is_match(&out) {
                out = pattern.replace_all(&out, *replacement).into_owned();
            }
        }
        out
    }

    /// Recursively redacts a JSON value: sensitive keys get their whole
    /// value replaced, every string gets pattern-scanned, depth beyond 10
    /// is clamped to a literal marker, and repeated node addresses (which
    /// cannot occur in an owned `serde_json::Value` tree, but are guarded
    /// against defensively) likewise clamp to a marker.
    pub fn redact_value(&self, value: &Json) -> Json {
        let mut seen = HashSet::new();
        self.redact_inner(value, 0, &mut seen)
    }

    fn redact_inner(&self, value: &Json, depth: usize, seen: &mut HashSet<usize>) -> Json {
        if depth > MAX_DEPTH {
            return Json::String(MAX_DEPTH_EXCEEDED.to_string());
        }
        let addr = value as *const Json as usize;
        if !seen.insert(addr) {
            return Json::String(CIRCULAR_REFERENCE.to_string());
        }

        let result = match value {
            Json::String(s) => Json::String(self.redact_str(s)),
            Json::Array(items) => Json::Array(
                items
                    .iter()
                    .map(|v| self.redact_inner(v, depth + 1, seen))
                    .collect(),
            ),
            Json::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, val) in map {
                    if self.sensitive_keys.contains(key.to_lowercase().as_str()) {
                        out.insert(key.clone(), Json::String("***REDACTED***".to_string()));
                    } else {
                        out.insert(key.clone(), self.redact_inner(val, depth + 1, seen));
                    }
                }
                Json::Object(out)
            }
            other => other.clone(),
        };

        seen.remove(&addr);
        result
    }
}

#[cfg(test)]
#[path = "redaction_tests.rs"]
mod tests;
