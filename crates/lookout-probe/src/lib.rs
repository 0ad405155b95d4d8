//! lookout-probe: one bounded HTTP probe per monitor per cycle.
//!
//! ```text
//! HealthChecker::check_all(monitors, timestamp, concurrency)
//!   ├── chunks of `concurrency` monitors, one scoped thread each
//!   │   └── HealthChecker::check() → StatusSample
//!   └── results returned in registry order
//! ```
//!
//! A probe never fails: timeouts, transport errors and non-success
//! statuses all resolve to a `down` sample with zero latency.

pub mod checker;

pub use checker::HealthChecker;
