use std::path::Path;

use lookout_core::{cycle_timestamp, LookoutPaths, Registry, Settings, StatusSample};
use lookout_probe::HealthChecker;
use lookout_store::HistoryStore;
use lookout_tracker::{GithubTracker, ReconcileReport, Reconciler, Tracker, TrackerCredentials};
use tracing::{error, info};

/// What one cycle did.
#[derive(Debug)]
pub struct CycleSummary {
    pub timestamp: String,
    pub results: Vec<StatusSample>,
    /// Samples in the persisted history.
    pub retained: usize,
    /// `None` when reconciliation was disabled; `Some(Err)` when it could not run.
    pub reconcile: Option<Result<ReconcileReport, String>>,
}

pub fn execute(
    root: &Path,
    registry: Option<&Path>,
    history: Option<&Path>,
    no_reconcile: bool,
) -> anyhow::Result<()> {
    let paths = LookoutPaths::discover(root)
        .with_registry(registry)
        .with_history(history);
    let settings = Settings::load(&paths.settings);
    let checker = HealthChecker::new(settings.check_timeout());

    let credentials = if no_reconcile {
        None
    } else {
        TrackerCredentials::from_env()
    };
    if credentials.is_none() {
        info!("no tracker credentials, incident management disabled");
    }
    let tracker = credentials.map(|c| GithubTracker::new(&c, settings.tracker_timeout()));
    let tracker = tracker.as_ref().map(|t| t as &dyn Tracker);

    let summary = run_cycle(&paths, &settings, &checker, tracker)?;
    print_summary(&summary);
    Ok(())
}

/// Run one end-to-end cycle: load → check → append/prune → persist → reconcile.
///
/// Errors only on the fatal steps (registry, persist). Reconciliation
/// problems are logged and reported in the summary.
pub fn run_cycle(
    paths: &LookoutPaths,
    settings: &Settings,
    checker: &HealthChecker,
    tracker: Option<&dyn Tracker>,
) -> anyhow::Result<CycleSummary> {
    let registry = Registry::load(&paths.registry)?;
    info!(monitors = registry.len(), "starting cycle");

    let store = HistoryStore::new(&paths.history, settings.history_cap);
    let prior = store.load();

    let timestamp = cycle_timestamp();
    let results = checker.check_all(registry.monitors(), &timestamp, settings.concurrency);

    let history = store.prune(HistoryStore::append(prior, &results));
    store.persist(&history)?;
    info!(added = results.len(), retained = history.len(), "history updated");

    let reconcile = tracker.map(|t| {
        Reconciler::new(t, &settings.incident_label)
            .reconcile(&results, &registry)
            .map_err(|e| {
                error!(error = %e, "incident reconciliation failed");
                e.to_string()
            })
    });

    Ok(CycleSummary {
        timestamp,
        results,
        retained: history.len(),
        reconcile,
    })
}

fn print_summary(summary: &CycleSummary) {
    println!("Cycle {}", summary.timestamp);
    for s in &summary.results {
        if s.is_up() {
            println!("  UP    {} ({} ms)", s.id, s.latency);
        } else {
            println!("  DOWN  {}", s.id);
        }
    }
    println!("History: {} samples", summary.retained);
    match &summary.reconcile {
        None => println!("Incidents: skipped"),
        Some(Ok(r)) => println!(
            "Incidents: {} opened, {} closed, {} unchanged, {} failed",
            r.opened, r.closed, r.unchanged, r.failed
        ),
        Some(Err(e)) => println!("Incidents: reconciliation failed: {e}"),
    }
}
