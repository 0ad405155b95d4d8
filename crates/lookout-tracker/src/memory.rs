use std::collections::HashSet;
use std::sync::Mutex;

use crate::error::{TrackerError, TrackerResult};
use crate::tracker::{Tracker, TrackerRecord};

/// A record held by [`MemoryTracker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRecord {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub open: bool,
    pub comments: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<MemoryRecord>,
    list_calls: usize,
    fail_listing: bool,
    fail_titles: HashSet<String>,
}

/// In-process tracker, used by tests.
#[derive(Debug, Default)]
pub struct MemoryTracker {
    state: Mutex<State>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an already-open record, as if created by an earlier cycle.
    pub fn seed_open(&self, title: &str, label: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let number = state.records.len() as u64 + 1;
        state.records.push(MemoryRecord {
            number,
            title: title.to_string(),
            body: String::new(),
            labels: vec![label.to_string()],
            open: true,
            comments: Vec::new(),
        });
        number
    }

    /// Make `list_open` fail.
    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    /// Make every write touching a record with this title fail.
    pub fn fail_on(&self, title: &str) {
        self.state.lock().unwrap().fail_titles.insert(title.to_string());
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn open_titles(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .iter()
            .filter(|r| r.open)
            .map(|r| r.title.clone())
            .collect()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().unwrap().list_calls
    }
}

impl Tracker for MemoryTracker {
    fn list_open(&self, label: &str) -> TrackerResult<Vec<TrackerRecord>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        if state.fail_listing {
            return Err(TrackerError::Transport("listing disabled".to_string()));
        }
        Ok(state
            .records
            .iter()
            .filter(|r| r.open && r.labels.iter().any(|l| l == label))
            .map(|r| TrackerRecord {
                number: r.number,
                title: r.title.clone(),
            })
            .collect())
    }

    fn create(&self, title: &str, body: &str, label: &str) -> TrackerResult<TrackerRecord> {
        let mut state = self.state.lock().unwrap();
        if state.fail_titles.contains(title) {
            return Err(TrackerError::Status {
                status: 500,
                message: format!("create refused for {title}"),
            });
        }
        let number = state.records.len() as u64 + 1;
        state.records.push(MemoryRecord {
            number,
            title: title.to_string(),
            body: body.to_string(),
            labels: vec![label.to_string()],
            open: true,
            comments: Vec::new(),
        });
        Ok(TrackerRecord {
            number,
            title: title.to_string(),
        })
    }

    fn comment_and_close(&self, number: u64, comment: &str) -> TrackerResult<()> {
        let mut state = self.state.lock().unwrap();
        let State {
            records,
            fail_titles,
            ..
        } = &mut *state;
        let record = records
            .iter_mut()
            .find(|r| r.number == number)
            .ok_or_else(|| TrackerError::Status {
                status: 404,
                message: format!("no record #{number}"),
            })?;
        if fail_titles.contains(&record.title) {
            return Err(TrackerError::Status {
                status: 500,
                message: format!("close refused for #{number}"),
            });
        }
        record.comments.push(comment.to_string());
        record.open = false;
        Ok(())
    }
}
