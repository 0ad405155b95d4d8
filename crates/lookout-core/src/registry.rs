use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;

use crate::types::MonitorDescriptor;

/// Ordered list of monitors checked by a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    monitors: Vec<MonitorDescriptor>,
}

impl Registry {
    /// Build a registry, rejecting duplicate ids.
    pub fn new(monitors: Vec<MonitorDescriptor>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for m in &monitors {
            if !seen.insert(m.id.as_str()) {
                anyhow::bail!("duplicate monitor id: {}", m.id);
            }
        }
        Ok(Self { monitors })
    }

    /// Load the registry file. Any failure is fatal to the cycle.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading registry: {}", path.display()))?;
        let monitors: Vec<MonitorDescriptor> = serde_json::from_str(&content)
            .with_context(|| format!("parsing registry: {}", path.display()))?;
        Self::new(monitors).with_context(|| format!("invalid registry: {}", path.display()))
    }

    pub fn get(&self, id: &str) -> Option<&MonitorDescriptor> {
        self.monitors.iter().find(|m| m.id == id)
    }

    pub fn monitors(&self) -> &[MonitorDescriptor] {
        &self.monitors
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}
