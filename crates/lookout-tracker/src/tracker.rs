use crate::error::TrackerResult;

/// An open record in the tracker (a GitHub issue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRecord {
    pub number: u64,
    pub title: String,
}

/// The three tracker operations reconciliation needs.
pub trait Tracker {
    /// List open records carrying `label`.
    fn list_open(&self, label: &str) -> TrackerResult<Vec<TrackerRecord>>;

    /// Create an open record tagged with `label`.
    fn create(&self, title: &str, body: &str, label: &str) -> TrackerResult<TrackerRecord>;

    /// Append `comment` to record `number`, then close it.
    fn comment_and_close(&self, number: u64, comment: &str) -> TrackerResult<()>;
}
