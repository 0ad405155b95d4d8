//! lookout-tracker: incidents as issues in an external tracker.
//!
//! No incident state is kept locally. Each cycle fetches the tracker's open,
//! labeled records once and derives every decision from that snapshot plus
//! the cycle's samples:
//!
//! | sample | open record | action |
//! |--------|-------------|--------|
//! | down   | no          | create `DOWN: {name} [{id}]` |
//! | down   | yes         | nothing |
//! | up     | yes         | comment, then close |
//! | up     | no          | nothing |
//!
//! Re-running a cycle against an unchanged world therefore writes nothing.

pub mod error;
pub mod github;
pub mod memory;
pub mod reconcile;
pub mod tracker;
pub mod trigger;

#[cfg(test)]
pub(crate) mod stub;

pub use error::{TrackerError, TrackerResult};
pub use github::{GithubTracker, TrackerCredentials};
pub use memory::MemoryTracker;
pub use reconcile::{plan_action, Action, ReconcileReport, Reconciler};
pub use tracker::{Tracker, TrackerRecord};
