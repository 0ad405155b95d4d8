use std::path::{Path, PathBuf};

pub const REGISTRY_FILE: &str = "monitor.config.json";
pub const HISTORY_FILE: &str = "status-data.json";
pub const SETTINGS_FILE: &str = "lookout.json";

/// Well-known files of a status repository.
#[derive(Debug, Clone)]
pub struct LookoutPaths {
    pub registry: PathBuf,
    pub history: PathBuf,
    pub settings: PathBuf,
}

impl LookoutPaths {
    /// Derive all paths from a repo root. Pure computation, no I/O.
    pub fn discover(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            registry: root.join(REGISTRY_FILE),
            history: root.join(HISTORY_FILE),
            settings: root.join(SETTINGS_FILE),
        }
    }

    pub fn with_registry(mut self, path: Option<&Path>) -> Self {
        if let Some(p) = path {
            self.registry = p.to_path_buf();
        }
        self
    }

    pub fn with_history(mut self, path: Option<&Path>) -> Self {
        if let Some(p) = path {
            self.history = p.to_path_buf();
        }
        self
    }
}
