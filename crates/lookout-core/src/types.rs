use serde::{Deserialize, Deserializer, Serialize};

/// Default HTTP method used when a monitor does not declare one.
pub const DEFAULT_METHOD: &str = "GET";

/// Monitor identifier, stable across runs (e.g. "google-dns").
pub type MonitorId = String;

/// A single HTTP(S) endpoint under observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorDescriptor {
    pub id: MonitorId,
    pub name: String,
    pub url: String,
    /// Null, empty or missing means GET.
    #[serde(default = "default_method", deserialize_with = "method_or_default")]
    pub method: String,
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

fn method_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let method = Option::<String>::deserialize(deserializer)?;
    Ok(method
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(default_method))
}

impl MonitorDescriptor {
    pub fn new(id: &str, name: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            method: default_method(),
        }
    }

    /// Title of the tracker record representing an open incident for this monitor.
    pub fn incident_title(&self) -> String {
        format!("DOWN: {} [{}]", self.name, self.id)
    }
}

/// Observed availability of a monitor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
}

/// One timestamped observation for one monitor. The unit of the history file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusSample {
    pub timestamp: String,
    pub id: MonitorId,
    pub status: Status,
    /// Milliseconds; always 0 for `down` samples.
    pub latency: u64,
}

impl StatusSample {
    pub fn up(id: &str, timestamp: &str, latency: u64) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            id: id.to_string(),
            status: Status::Up,
            latency,
        }
    }

    pub fn down(id: &str, timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            id: id.to_string(),
            status: Status::Down,
            latency: 0,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == Status::Up
    }
}
