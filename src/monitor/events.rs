//! Lifecycle event and status types published by the monitor.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Notification of a monitor state transition.
///
/// Events are ephemeral: subscribers that lag past the channel capacity
/// miss them, and nothing is replayed on subscribe.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The background loop has been scheduled and is about to iterate
    Started,
    /// The background loop has fully exited
    Stopped,
    /// One loop body completed: work unit ran and the delay was computed
    Iterated(IterationReport),
}

/// Per-iteration payload carried by [`MonitorEvent::Iterated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationReport {
    /// Requests consumed in the current quota window
    pub used: u64,
    /// Requests left before throttling
    pub remaining: u64,
    /// Seconds until the quota window resets
    pub reset_seconds: u64,
    /// 1-based iteration counter within this run
    pub iteration: u64,
    /// Wall-clock cost of the work-unit call
    pub call_duration: Duration,
    /// Pacing delay applied after this iteration
    pub delay: Duration,
    /// When the iteration completed
    pub at: DateTime<Utc>,
}

/// Point-in-time view of the monitor lifecycle.
///
/// `started_at` is present iff `running`; both are cleared together when
/// the loop exits for any reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorStatus {
    /// Whether a background loop is currently active
    pub running: bool,
    /// When the active run started
    pub started_at: Option<DateTime<Utc>>,
    /// Iterations completed by the active (or most recent) run
    pub iterations: u64,
}
