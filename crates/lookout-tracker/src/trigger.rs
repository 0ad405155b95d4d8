//! Remote trigger: ask GitHub Actions to run one cycle now.
//!
//! Sends a `repository_dispatch` event; the workflow listening for it runs
//! `lookout run`. A failure is reported once, with no retry.

use std::time::Duration;

use tracing::info;

use crate::error::TrackerResult;
use crate::github::{RepoApi, DEFAULT_API_BASE};

/// Event type the monitoring workflow listens for.
pub const DISPATCH_EVENT: &str = "trigger-monitor";

/// Where to send the dispatch and with which token.
#[derive(Clone)]
pub struct DispatchTarget {
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub api_base: String,
}

impl std::fmt::Debug for DispatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTarget")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl DispatchTarget {
    pub fn new(owner: &str, repo: &str, token: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

/// Fire a `repository_dispatch` event.
pub fn dispatch(
    target: &DispatchTarget,
    event_type: &str,
    timeout: Duration,
) -> TrackerResult<()> {
    let api = RepoApi::new(
        &target.api_base,
        &target.owner,
        &target.repo,
        &target.token,
        timeout,
    );
    api.post("/dispatches", &serde_json::json!({ "event_type": event_type }))?;
    info!(owner = %target.owner, repo = %target.repo, %event_type, "dispatched cycle");
    Ok(())
}
