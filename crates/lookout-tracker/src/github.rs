use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{TrackerError, TrackerResult};
use crate::tracker::{Tracker, TrackerRecord};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("lookout/", env!("CARGO_PKG_VERSION"));
/// GitHub's maximum page size.
const PAGE_SIZE: &str = "100";
/// Listing stops after this many pages.
const MAX_PAGES: u32 = 10;

// ── Credentials ──

/// Token and target repository for the tracker.
#[derive(Clone, PartialEq, Eq)]
pub struct TrackerCredentials {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub api_base: String,
}

impl std::fmt::Debug for TrackerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerCredentials")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl TrackerCredentials {
    /// Read `GITHUB_TOKEN`, `GITHUB_REPOSITORY` and optional `GITHUB_API_URL`.
    /// Returns `None` when reconciliation should be skipped.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(
            std::env::var("GITHUB_TOKEN").ok(),
            std::env::var("GITHUB_REPOSITORY").ok(),
            std::env::var("GITHUB_API_URL").ok(),
        )
    }

    pub fn from_vars(
        token: Option<String>,
        repository: Option<String>,
        api_base: Option<String>,
    ) -> Option<Self> {
        let token = token.filter(|t| !t.trim().is_empty())?;
        let Some((owner, repo)) = repository.as_deref().and_then(parse_repository) else {
            warn!("GITHUB_REPOSITORY missing or malformed, skipping issue management");
            return None;
        };
        Some(Self {
            token,
            owner,
            repo,
            api_base: api_base
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }
}

/// Split `owner/repo`.
pub fn parse_repository(s: &str) -> Option<(String, String)> {
    let (owner, repo) = s.trim().split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

// ── REST plumbing ──

/// One page of a listing.
pub(crate) struct Page {
    pub body: String,
    /// GitHub advertised a `rel="next"` page.
    pub has_next: bool,
}

/// Authenticated access to one repository's REST endpoints.
pub(crate) struct RepoApi {
    agent: ureq::Agent,
    base: String,
    token: String,
}

impl RepoApi {
    pub(crate) fn new(
        api_base: &str,
        owner: &str,
        repo: &str,
        token: &str,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            base: format!("{}/repos/{owner}/{repo}", api_base.trim_end_matches('/')),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn authed<B>(&self, req: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        req.header("Authorization", &format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
    }

    pub(crate) fn get(&self, path: &str, query: &[(&str, &str)]) -> TrackerResult<Page> {
        let mut req = self.authed(self.agent.get(&self.url(path)));
        for (k, v) in query {
            req = req.query(*k, *v);
        }
        let resp = req.call().map_err(transport)?;
        let has_next = resp
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .is_some_and(has_next_link);
        Ok(Page {
            body: read_response(resp)?,
            has_next,
        })
    }

    pub(crate) fn post(&self, path: &str, payload: &serde_json::Value) -> TrackerResult<String> {
        let resp = self
            .authed(self.agent.post(&self.url(path)))
            .header("Content-Type", "application/json")
            .send(payload.to_string())
            .map_err(transport)?;
        read_response(resp)
    }

    pub(crate) fn patch(&self, path: &str, payload: &serde_json::Value) -> TrackerResult<String> {
        let resp = self
            .authed(self.agent.patch(&self.url(path)))
            .header("Content-Type", "application/json")
            .send(payload.to_string())
            .map_err(transport)?;
        read_response(resp)
    }
}

fn transport(e: ureq::Error) -> TrackerError {
    if matches!(e, ureq::Error::Timeout(_)) {
        return TrackerError::Transport(format!("timed out: {e}"));
    }
    TrackerError::Transport(e.to_string())
}

fn read_response(mut resp: ureq::http::Response<ureq::Body>) -> TrackerResult<String> {
    let status = resp.status().as_u16();
    let quota_exhausted = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");
    let body = resp.body_mut().read_to_string().map_err(transport)?;
    classify(status, quota_exhausted, body)
}

/// Whether a `Link` header carries a `rel="next"` entry.
fn has_next_link(link: &str) -> bool {
    link.split(',')
        .any(|entry| entry.split(';').skip(1).any(|p| p.trim() == r#"rel="next""#))
}

/// Map an HTTP status to success or a typed tracker error.
fn classify(status: u16, quota_exhausted: bool, body: String) -> TrackerResult<String> {
    if (200..300).contains(&status) {
        return Ok(body);
    }
    let message = error_message(&body);
    Err(match status {
        429 => TrackerError::RateLimited(message),
        403 if quota_exhausted => TrackerError::RateLimited(message),
        401 | 403 => TrackerError::Auth(message),
        _ => TrackerError::Status { status, message },
    })
}

/// GitHub puts a human-readable reason in `message`; fall back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

// ── Issues ──

#[derive(Deserialize)]
struct Issue {
    number: u64,
    title: String,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

impl From<Issue> for TrackerRecord {
    fn from(issue: Issue) -> Self {
        TrackerRecord {
            number: issue.number,
            title: issue.title,
        }
    }
}

/// GitHub issues as incident records.
pub struct GithubTracker {
    api: RepoApi,
}

impl GithubTracker {
    pub fn new(credentials: &TrackerCredentials, timeout: Duration) -> Self {
        Self {
            api: RepoApi::new(
                &credentials.api_base,
                &credentials.owner,
                &credentials.repo,
                &credentials.token,
                timeout,
            ),
        }
    }
}

impl Tracker for GithubTracker {
    /// Collects every page of open issues carrying `label`.
    fn list_open(&self, label: &str) -> TrackerResult<Vec<TrackerRecord>> {
        let mut records = Vec::new();
        for number in 1..=MAX_PAGES {
            let number = number.to_string();
            let page = self.api.get(
                "/issues",
                &[
                    ("state", "open"),
                    ("labels", label),
                    ("per_page", PAGE_SIZE),
                    ("page", number.as_str()),
                ],
            )?;
            let issues: Vec<Issue> = serde_json::from_str(&page.body)
                .map_err(|e| TrackerError::Decode(e.to_string()))?;
            records.extend(
                issues
                    .into_iter()
                    .filter(|i| i.pull_request.is_none())
                    .map(TrackerRecord::from),
            );
            if !page.has_next {
                debug!(count = records.len(), %label, "listed open issues");
                return Ok(records);
            }
        }
        warn!(count = records.len(), pages = MAX_PAGES, %label, "open issue listing truncated");
        Ok(records)
    }

    fn create(&self, title: &str, body: &str, label: &str) -> TrackerResult<TrackerRecord> {
        let payload = serde_json::json!({
            "title": title,
            "body": body,
            "labels": [label],
        });
        let resp = self.api.post("/issues", &payload)?;
        let issue: Issue =
            serde_json::from_str(&resp).map_err(|e| TrackerError::Decode(e.to_string()))?;
        info!(number = issue.number, %title, "opened issue");
        Ok(issue.into())
    }

    fn comment_and_close(&self, number: u64, comment: &str) -> TrackerResult<()> {
        self.api.post(
            &format!("/issues/{number}/comments"),
            &serde_json::json!({ "body": comment }),
        )?;
        self.api.patch(
            &format!("/issues/{number}"),
            &serde_json::json!({ "state": "closed", "state_reason": "completed" }),
        )?;
        info!(number, "closed issue");
        Ok(())
    }
}
