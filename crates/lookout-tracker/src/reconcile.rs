//! Incident reconciliation.
//!
//! Every decision is a pure function of the cycle's sample and a snapshot of
//! the tracker's open records taken once, before any write.

use lookout_core::{MonitorDescriptor, Registry, Status, StatusSample};
use tracing::{debug, error, info, warn};

use crate::error::TrackerResult;
use crate::tracker::{Tracker, TrackerRecord};

/// What to do for one monitor this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Create a new open record.
    Open,
    /// Comment on and close these records.
    Close(Vec<u64>),
    /// Tracker already reflects the sample.
    None,
}

/// Counts for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub opened: usize,
    pub closed: usize,
    pub unchanged: usize,
    /// Samples whose id is not in the registry.
    pub skipped: usize,
    /// Tracker writes that failed.
    pub failed: usize,
}

/// Open records belonging to `monitor`.
///
/// A record belongs to a monitor when its title has the incident shape and
/// ends with the monitor's bracketed id, so renaming a monitor does not
/// orphan its open incident. The exact `DOWN: {name} [{id}]` title is the
/// common case of this rule.
pub fn matching_records<'a>(
    monitor: &MonitorDescriptor,
    open: &'a [TrackerRecord],
) -> Vec<&'a TrackerRecord> {
    let suffix = format!(" [{}]", monitor.id);
    open.iter()
        .filter(|r| r.title.starts_with("DOWN: ") && r.title.ends_with(&suffix))
        .collect()
}

/// Decide the action for one sample against the open-record snapshot.
pub fn plan_action(
    sample: &StatusSample,
    monitor: &MonitorDescriptor,
    open: &[TrackerRecord],
) -> Action {
    let existing = matching_records(monitor, open);
    match (sample.status, existing.is_empty()) {
        (Status::Down, true) => Action::Open,
        (Status::Up, false) => Action::Close(existing.iter().map(|r| r.number).collect()),
        _ => Action::None,
    }
}

pub fn incident_body(monitor: &MonitorDescriptor, timestamp: &str) -> String {
    format!(
        "Monitor **{}** is down at {timestamp}.\nURL: {}",
        monitor.name, monitor.url
    )
}

pub fn resolution_comment(monitor: &MonitorDescriptor, timestamp: &str) -> String {
    format!("Monitor **{}** is back up at {timestamp}.", monitor.name)
}

/// Aligns tracker records with the latest samples.
pub struct Reconciler<'a, T: Tracker + ?Sized> {
    tracker: &'a T,
    label: String,
}

impl<'a, T: Tracker + ?Sized> Reconciler<'a, T> {
    pub fn new(tracker: &'a T, label: &str) -> Self {
        Self {
            tracker,
            label: label.to_string(),
        }
    }

    /// Reconcile one cycle's results.
    ///
    /// Fails only if the open-record listing fails: without a snapshot no
    /// decision is safe. Individual write failures are logged and counted,
    /// and the remaining monitors are still processed.
    pub fn reconcile(
        &self,
        results: &[StatusSample],
        registry: &Registry,
    ) -> TrackerResult<ReconcileReport> {
        let open = self.tracker.list_open(&self.label)?;
        debug!(open = open.len(), label = %self.label, "fetched open incidents");

        let mut report = ReconcileReport::default();
        for sample in results {
            let Some(monitor) = registry.get(&sample.id) else {
                warn!(id = %sample.id, "sample has no registry entry, skipping");
                report.skipped += 1;
                continue;
            };

            match plan_action(sample, monitor, &open) {
                Action::Open => self.open(monitor, sample, &mut report),
                Action::Close(numbers) => {
                    for number in numbers {
                        self.close(monitor, sample, number, &mut report);
                    }
                }
                Action::None => report.unchanged += 1,
            }
        }

        info!(
            opened = report.opened,
            closed = report.closed,
            unchanged = report.unchanged,
            failed = report.failed,
            "reconciliation complete"
        );
        Ok(report)
    }

    fn open(
        &self,
        monitor: &MonitorDescriptor,
        sample: &StatusSample,
        report: &mut ReconcileReport,
    ) {
        let title = monitor.incident_title();
        let body = incident_body(monitor, &sample.timestamp);
        info!(id = %monitor.id, %title, "opening incident");
        match self.tracker.create(&title, &body, &self.label) {
            Ok(_) => report.opened += 1,
            Err(e) => {
                error!(id = %monitor.id, error = %e, "failed to open incident");
                report.failed += 1;
            }
        }
    }

    fn close(
        &self,
        monitor: &MonitorDescriptor,
        sample: &StatusSample,
        number: u64,
        report: &mut ReconcileReport,
    ) {
        let comment = resolution_comment(monitor, &sample.timestamp);
        info!(id = %monitor.id, number, "closing incident");
        match self.tracker.comment_and_close(number, &comment) {
            Ok(()) => report.closed += 1,
            Err(e) => {
                error!(id = %monitor.id, number, error = %e, "failed to close incident");
                report.failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTracker;

    const LABEL: &str = "incident";
    const T1: &str = "2024-05-01T12:00:00.000Z";
    const T2: &str = "2024-05-01T12:05:00.000Z";

    fn site_a() -> MonitorDescriptor {
        MonitorDescriptor::new("a", "Site A", "https://a.example")
    }

    fn registry() -> Registry {
        Registry::new(vec![
            site_a(),
            MonitorDescriptor::new("b", "Site B", "https://b.example"),
        ])
        .unwrap()
    }

    fn record(number: u64, title: &str) -> TrackerRecord {
        TrackerRecord {
            number,
            title: title.to_string(),
        }
    }

    #[test]
    fn plan_covers_all_four_cases() {
        let m = site_a();
        let open = [record(3, "DOWN: Site A [a]")];
        let down = StatusSample::down("a", T1);
        let up = StatusSample::up("a", T1, 80);

        assert_eq!(plan_action(&down, &m, &[]), Action::Open);
        assert_eq!(plan_action(&down, &m, &open), Action::None);
        assert_eq!(plan_action(&up, &m, &open), Action::Close(vec![3]));
        assert_eq!(plan_action(&up, &m, &[]), Action::None);
    }

    #[test]
    fn matching_ignores_other_monitors_and_titles() {
        let m = site_a();
        let open = [
            record(1, "DOWN: Site AB [ab]"),
            record(2, "Question about [a]"),
            record(3, "DOWN: Site A [a]"),
        ];
        let found: Vec<u64> = matching_records(&m, &open).iter().map(|r| r.number).collect();
        assert_eq!(found, [3]);
    }

    #[test]
    fn renamed_monitor_still_matches_by_id() {
        let m = MonitorDescriptor::new("a", "Site A (new name)", "https://a.example");
        let open = [record(5, "DOWN: Site A [a]")];
        assert_eq!(
            plan_action(&StatusSample::up("a", T1, 10), &m, &open),
            Action::Close(vec![5])
        );
        assert_eq!(plan_action(&StatusSample::down("a", T1), &m, &open), Action::None);
    }

    #[test]
    fn down_opens_record_with_title_body_and_label() {
        let t = MemoryTracker::new();
        let report = Reconciler::new(&t, LABEL)
            .reconcile(&[StatusSample::down("a", T1)], &registry())
            .unwrap();

        assert_eq!(report.opened, 1);
        let rec = &t.records()[0];
        assert_eq!(rec.title, "DOWN: Site A [a]");
        assert!(rec.body.contains(T1));
        assert!(rec.body.contains("https://a.example"));
        assert_eq!(rec.labels, [LABEL]);
        assert!(rec.open);
    }

    #[test]
    fn repeated_down_is_idempotent() {
        let t = MemoryTracker::new();
        let reg = registry();
        let rec = Reconciler::new(&t, LABEL);

        rec.reconcile(&[StatusSample::down("a", T1)], &reg).unwrap();
        let second = rec.reconcile(&[StatusSample::down("a", T2)], &reg).unwrap();

        assert_eq!(second.opened, 0);
        assert_eq!(second.unchanged, 1);
        assert_eq!(t.open_titles(), ["DOWN: Site A [a]"]);
        assert_eq!(t.records().len(), 1);
    }

    #[test]
    fn recovery_comments_then_closes() {
        let t = MemoryTracker::new();
        let number = t.seed_open("DOWN: Site A [a]", LABEL);

        let report = Reconciler::new(&t, LABEL)
            .reconcile(&[StatusSample::up("a", T2, 80)], &registry())
            .unwrap();

        assert_eq!(report.closed, 1);
        let rec = t.records().into_iter().find(|r| r.number == number).unwrap();
        assert!(!rec.open);
        assert_eq!(rec.comments, ["Monitor **Site A** is back up at 2024-05-01T12:05:00.000Z."]);
    }

    #[test]
    fn down_after_close_opens_new_record() {
        let t = MemoryTracker::new();
        let reg = registry();
        let rec = Reconciler::new(&t, LABEL);

        rec.reconcile(&[StatusSample::down("a", T1)], &reg).unwrap();
        rec.reconcile(&[StatusSample::up("a", T2, 50)], &reg).unwrap();
        rec.reconcile(&[StatusSample::down("a", T2)], &reg).unwrap();

        let records = t.records();
        assert_eq!(records.len(), 2);
        assert!(!records[0].open);
        assert!(records[1].open);
    }

    #[test]
    fn records_without_label_are_invisible() {
        let t = MemoryTracker::new();
        t.seed_open("DOWN: Site A [a]", "question");

        Reconciler::new(&t, LABEL)
            .reconcile(&[StatusSample::down("a", T1)], &registry())
            .unwrap();
        assert_eq!(t.open_titles().len(), 2);
    }

    #[test]
    fn duplicate_open_records_all_close() {
        let t = MemoryTracker::new();
        t.seed_open("DOWN: Site A [a]", LABEL);
        t.seed_open("DOWN: Site A [a]", LABEL);

        let report = Reconciler::new(&t, LABEL)
            .reconcile(&[StatusSample::up("a", T2, 5)], &registry())
            .unwrap();
        assert_eq!(report.closed, 2);
        assert!(t.open_titles().is_empty());
    }

    #[test]
    fn one_failure_does_not_stop_others() {
        let t = MemoryTracker::new();
        t.fail_on("DOWN: Site A [a]");

        let report = Reconciler::new(&t, LABEL)
            .reconcile(
                &[StatusSample::down("a", T1), StatusSample::down("b", T1)],
                &registry(),
            )
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.opened, 1);
        assert_eq!(t.open_titles(), ["DOWN: Site B [b]"]);
    }

    #[test]
    fn listing_once_per_cycle() {
        let t = MemoryTracker::new();
        Reconciler::new(&t, LABEL)
            .reconcile(
                &[StatusSample::down("a", T1), StatusSample::up("b", T1, 3)],
                &registry(),
            )
            .unwrap();
        assert_eq!(t.list_calls(), 1);
    }

    #[test]
    fn listing_failure_aborts_without_writes() {
        let t = MemoryTracker::new();
        t.fail_listing(true);
        let result =
            Reconciler::new(&t, LABEL).reconcile(&[StatusSample::down("a", T1)], &registry());
        assert!(result.is_err());
        assert!(t.records().is_empty());
    }

    #[test]
    fn unknown_monitor_is_skipped() {
        let t = MemoryTracker::new();
        let report = Reconciler::new(&t, LABEL)
            .reconcile(&[StatusSample::down("ghost", T1)], &registry())
            .unwrap();
        assert_eq!(report.skipped, 1);
        assert!(t.records().is_empty());
    }

    #[test]
    fn works_through_trait_object() {
        let t = MemoryTracker::new();
        let dyn_tracker: &dyn Tracker = &t;
        Reconciler::new(dyn_tracker, LABEL)
            .reconcile(&[StatusSample::down("b", T1)], &registry())
            .unwrap();
        assert_eq!(t.open_titles(), ["DOWN: Site B [b]"]);
    }
}
