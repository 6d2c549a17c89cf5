//! Monitor core - supervised polling loop with lifecycle events
//!
//! [`ApiMonitor`] runs a caller-supplied [`MonitorTask`] repeatedly on a
//! background tokio task, feeds the quota feedback of every call into the
//! [`RateTracker`](crate::ratelimit::RateTracker), and sleeps out the
//! computed pacing delay between iterations. Start/stop/status are safe to
//! invoke from concurrent callers; state transitions are published on a
//! broadcast channel.

pub mod controller;
pub mod events;
pub mod task;

pub use controller::ApiMonitor;
pub use events::{IterationReport, MonitorEvent, MonitorStatus};
pub use task::{MonitorTask, TaskFn};
