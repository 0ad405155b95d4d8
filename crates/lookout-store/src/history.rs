//! Append-only, retention-capped status history.
//!
//! The history file is a pretty-printed JSON array of [`StatusSample`] in
//! chronological (insertion) order. It is read once at cycle start and
//! replaced wholesale at cycle end; it is never edited in place.
//!
//! Retention is global: once the file holds more than `cap` samples the
//! oldest ones are dropped regardless of which monitor they belong to.

use std::path::{Path, PathBuf};

use anyhow::Context;
use lookout_core::StatusSample;
use tracing::{debug, warn};

use crate::write_atomic;

/// History file handle.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    cap: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: path.into(),
            cap,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load prior history. A missing or malformed file means "start fresh".
    pub fn load(&self) -> Vec<StatusSample> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "cannot read history, starting fresh");
                }
                return Vec::new();
            }
        };
        if content.trim().is_empty() {
            return Vec::new();
        }
        match serde_json::from_str::<Vec<StatusSample>>(&content) {
            Ok(samples) => {
                debug!(count = samples.len(), "loaded history");
                samples
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed history, starting fresh");
                Vec::new()
            }
        }
    }

    /// Concatenate a cycle's batch after the prior history, preserving order.
    pub fn append(current: Vec<StatusSample>, results: &[StatusSample]) -> Vec<StatusSample> {
        let mut history = current;
        history.extend_from_slice(results);
        history
    }

    /// Drop the oldest samples until the history fits the cap.
    pub fn prune(&self, mut history: Vec<StatusSample>) -> Vec<StatusSample> {
        if history.len() > self.cap {
            let excess = history.len() - self.cap;
            history.drain(..excess);
        }
        history
    }

    /// Replace the history file with `history`.
    pub fn persist(&self, history: &[StatusSample]) -> anyhow::Result<()> {
        let mut data = serde_json::to_string_pretty(history)?;
        data.push('\n');
        write_atomic(&self.path, data.as_bytes())
            .with_context(|| format!("writing history: {}", self.path.display()))
    }
}
