use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_HISTORY_CAP: usize = 5000;
pub const DEFAULT_CHECK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_TRACKER_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_INCIDENT_LABEL: &str = "incident";

/// Probe settings, stored in `lookout.json` at the repo root. Every key is optional.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Maximum number of samples kept in the history file, across all monitors.
    pub history_cap: usize,
    pub check_timeout_ms: u64,
    pub tracker_timeout_ms: u64,
    /// Upper bound on health checks running at the same time.
    pub concurrency: usize,
    pub incident_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            check_timeout_ms: DEFAULT_CHECK_TIMEOUT_MS,
            tracker_timeout_ms: DEFAULT_TRACKER_TIMEOUT_MS,
            concurrency: DEFAULT_CONCURRENCY,
            incident_label: DEFAULT_INCIDENT_LABEL.to_string(),
        }
    }
}

impl Settings {
    /// Load from `lookout.json`.
    /// Returns defaults if the file is missing or unparseable.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str::<Settings>(&content) {
            Ok(s) => s.normalized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unparseable settings file");
                Self::default()
            }
        }
    }

    fn normalized(mut self) -> Self {
        self.concurrency = self.concurrency.max(1);
        self.history_cap = self.history_cap.max(1);
        self
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn tracker_timeout(&self) -> Duration {
        Duration::from_millis(self.tracker_timeout_ms)
    }
}
