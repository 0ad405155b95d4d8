use std::time::Duration;

use anyhow::Context;
use lookout_tracker::github::parse_repository;
use lookout_tracker::trigger::{dispatch, DispatchTarget};

pub fn execute(
    owner: Option<String>,
    repo: Option<String>,
    event_type: &str,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let target = resolve_target(
        owner,
        repo,
        std::env::var("GITHUB_REPOSITORY").ok(),
        std::env::var("GITHUB_PAT").ok(),
        std::env::var("GITHUB_API_URL").ok(),
    )?;
    dispatch(&target, event_type, Duration::from_secs(timeout_secs))
        .map_err(|e| anyhow::anyhow!("GitHub API error: {e}"))?;
    println!("Dispatched {event_type} to {}/{}", target.owner, target.repo);
    Ok(())
}

/// Explicit `--owner`/`--repo` win over `GITHUB_REPOSITORY`.
fn resolve_target(
    owner: Option<String>,
    repo: Option<String>,
    repository: Option<String>,
    token: Option<String>,
    api_base: Option<String>,
) -> anyhow::Result<DispatchTarget> {
    let token = token
        .filter(|t| !t.trim().is_empty())
        .context("missing GITHUB_PAT")?;
    let from_env = repository.as_deref().and_then(parse_repository);
    let (owner, repo) = match (owner, repo, from_env) {
        (Some(o), Some(r), _) => (o, r),
        (o, r, Some((env_owner, env_repo))) => (o.unwrap_or(env_owner), r.unwrap_or(env_repo)),
        _ => anyhow::bail!("repository unknown: pass --owner and --repo or set GITHUB_REPOSITORY"),
    };
    let mut target = DispatchTarget::new(&owner, &repo, &token);
    if let Some(base) = api_base.filter(|b| !b.trim().is_empty()) {
        target.api_base = base;
    }
    Ok(target)
}
