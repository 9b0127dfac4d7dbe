// src/change_detector.rs
//! Drift detection for monitored law pages.
//!
//! The caller hands over already-fetched, boilerplate-stripped text; this
//! module hashes it, compares against the last stored snapshot, and reports
//! a change percentage when the drift clears the configured threshold.
//! "No change" is the normal case, never an error.

use anyhow::Result;
use chrono::Utc;
use sha2::{Digest, Sha256};
use strsim::normalized_levenshtein;

use crate::store::{DocumentSnapshot, Store};

pub const DEFAULT_CHANGE_THRESHOLD: f64 = 0.5;

/// How much of each document is kept for diffing.
const TRUNCATE_CHARS: usize = 5000;

/// A reported document change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeResult {
    /// `(1 - similarity) * 100`, rounded to 2 decimals.
    pub change_percent: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeDetector {
    /// Minimum change percent worth reporting; guards against noise from
    /// whitespace or ads shifting slightly.
    threshold: f64,
}

impl ChangeDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.max(0.0),
        }
    }

    /// Compare `current_text` against the stored snapshot for `name`.
    ///
    /// First observation stores a baseline and reports nothing. The snapshot
    /// is overwritten on every check, whether or not a change was reported.
    pub fn check(&self, store: &Store, name: &str, current_text: &str) -> Result<Option<ChangeResult>> {
        let normalized = collapse_whitespace(current_text);
        let hash = content_hash(&normalized);
        let truncated = truncate_chars(&normalized, TRUNCATE_CHARS);

        let prior = store.load_snapshot(name)?;

        let result = match prior {
            None => {
                tracing::debug!(document = name, "first observation, storing baseline");
                None
            }
            Some(prev) if prev.content_hash == hash => None,
            Some(prev) => {
                let similarity = normalized_levenshtein(&prev.truncated_text, &truncated);
                let change_percent = ((1.0 - similarity) * 100.0 * 100.0).round() / 100.0;
                if change_percent >= self.threshold {
                    tracing::info!(document = name, change_percent, "document changed");
                    Some(ChangeResult { change_percent })
                } else {
                    tracing::debug!(document = name, change_percent, "change below threshold");
                    None
                }
            }
        };

        store.save_snapshot(&DocumentSnapshot {
            name: name.to_string(),
            content_hash: hash,
            truncated_text: truncated,
            checked_at: Utc::now(),
        })?;

        Ok(result)
    }
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_THRESHOLD)
    }
}

/// Full SHA-256 hex digest of the text.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
