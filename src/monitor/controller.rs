//! Polling controller - owns the run lifecycle and drives the tracker.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{RedmonError, Result};
use crate::monitor::events::{IterationReport, MonitorEvent, MonitorStatus};
use crate::monitor::task::MonitorTask;
use crate::ratelimit::{RateSnapshot, RateTracker};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Cancellation handle for the run currently in flight.
struct ActiveRun {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Lifecycle fields, mutated only under the lock and never across awaits.
///
/// `run_seq` identifies the run that owns the status: a superseded loop
/// winding down must not clobber the state its replacement just installed.
#[derive(Default)]
struct StatusInner {
    running: bool,
    started_at: Option<DateTime<Utc>>,
    iterations: u64,
    run_seq: u64,
    active: Option<ActiveRun>,
}

/// Supervised polling loop controller.
///
/// Runs a [`MonitorTask`] repeatedly on a background tokio task until
/// stopped or until the task fails. Each iteration feeds the task's quota
/// feedback into the shared [`RateTracker`] and sleeps out the computed
/// pacing delay. `start`/`stop`/`status` may be called from arbitrary
/// concurrent callers.
pub struct ApiMonitor {
    tracker: Arc<RateTracker>,
    state: Arc<Mutex<StatusInner>>,
    events: broadcast::Sender<MonitorEvent>,
}

impl ApiMonitor {
    /// Create a monitor with its own rate tracker.
    pub fn new() -> Self {
        Self::with_tracker(Arc::new(RateTracker::new()))
    }

    /// Create a monitor around an externally shared tracker.
    pub fn with_tracker(tracker: Arc<RateTracker>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tracker,
            state: Arc::new(Mutex::new(StatusInner::default())),
            events,
        }
    }

    /// Start the polling loop with the given work unit.
    ///
    /// Installs a fresh cancellation context, resets the iteration counter,
    /// and returns once the loop has been scheduled and [`MonitorEvent::Started`]
    /// has been published. Starting while a run is active supersedes it: the
    /// previous run is cancelled and a new context installed. Callers that
    /// want "already running" rejected should check [`status`](Self::status)
    /// first; that policy belongs at the boundary, not here.
    pub async fn start(&self, task: Arc<dyn MonitorTask>) -> Result<()> {
        let cancel = CancellationToken::new();
        let (started_tx, started_rx) = oneshot::channel();

        // Counter reset, spawn, and handle installation happen under one
        // lock so concurrent starts cannot interleave and strand a loop.
        let superseded = {
            let mut inner = self.state.lock();
            inner.run_seq += 1;
            inner.running = true;
            inner.started_at = Some(Utc::now());
            inner.iterations = 0;
            let run_id = inner.run_seq;

            let handle = tokio::spawn(run_loop(
                task,
                Arc::clone(&self.tracker),
                Arc::clone(&self.state),
                self.events.clone(),
                cancel.clone(),
                run_id,
                started_tx,
            ));
            inner.active.replace(ActiveRun { cancel, handle })
        };
        if let Some(previous) = superseded {
            tracing::warn!("superseding an active run");
            previous.cancel.cancel();
        }

        // The loop fulfills this right after broadcasting Started, so the
        // caller returns only once subscribers could observe the event.
        if started_rx.await.is_err() {
            return Err(RedmonError::WorkUnit(
                "monitor loop exited before signalling start".to_string(),
            ));
        }

        Ok(())
    }

    /// Stop the active run and wait for the loop to fully exit.
    ///
    /// Returns after [`MonitorEvent::Stopped`] has been published. Stopping
    /// an idle monitor is a no-op that completes without error and fires no
    /// event.
    pub async fn stop(&self) -> Result<()> {
        let active = self.state.lock().active.take();
        let Some(active) = active else {
            tracing::debug!("stop requested but no run is active");
            return Ok(());
        };

        active.cancel.cancel();
        if let Err(err) = active.handle.await {
            tracing::error!(error = %err, "monitor loop task panicked");
        }

        Ok(())
    }

    /// Point-in-time lifecycle snapshot; never blocks on the loop.
    pub fn status(&self) -> MonitorStatus {
        let inner = self.state.lock();
        MonitorStatus {
            running: inner.running,
            started_at: inner.started_at,
            iterations: inner.iterations,
        }
    }

    /// Copy of the tracker's current quota state.
    pub fn rate_snapshot(&self) -> RateSnapshot {
        self.tracker.snapshot()
    }

    /// Subscribe to lifecycle events.
    ///
    /// Handlers run in the subscriber's own task, outside any monitor lock,
    /// so they may freely call back into the monitor.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events.subscribe()
    }
}

impl Default for ApiMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Body of one run: iterate until cancelled or the work unit fails.
async fn run_loop(
    task: Arc<dyn MonitorTask>,
    tracker: Arc<RateTracker>,
    state: Arc<Mutex<StatusInner>>,
    events: broadcast::Sender<MonitorEvent>,
    cancel: CancellationToken,
    run_id: u64,
    started_tx: oneshot::Sender<()>,
) {
    tracing::info!(run_id, "monitor loop starting");
    let _ = events.send(MonitorEvent::Started);
    let _ = started_tx.send(());

    while !cancel.is_cancelled() {
        let began = Instant::now();
        let feedback = match task.run().await {
            Ok(feedback) => feedback,
            Err(RedmonError::Cancelled) => break,
            Err(err) => {
                tracing::error!(run_id, error = %err, "work unit failed, stopping run");
                break;
            }
        };
        let call_duration = began.elapsed();

        if let Err(err) = tracker.update(feedback, call_duration) {
            tracing::error!(run_id, error = %err, "rejected rate feedback, stopping run");
            break;
        }
        let delay = tracker.compute_delay();

        let iteration = {
            let mut inner = state.lock();
            if inner.run_seq != run_id {
                // Superseded while we were in flight; the new run owns the
                // counters now.
                break;
            }
            inner.iterations += 1;
            inner.iterations
        };

        let snapshot = tracker.snapshot();
        tracing::debug!(
            run_id,
            iteration,
            remaining = snapshot.remaining,
            delay_ms = delay.as_millis() as u64,
            "iteration complete"
        );
        let _ = events.send(MonitorEvent::Iterated(IterationReport {
            used: snapshot.used,
            remaining: snapshot.remaining,
            reset_seconds: snapshot.reset_window.as_secs(),
            iteration,
            call_duration,
            delay,
            at: Utc::now(),
        }));

        // Cancellation here is the normal stop path, not a failure.
        if tracker.apply_delay(&cancel).await.is_err() {
            break;
        }
    }

    {
        let mut inner = state.lock();
        if inner.run_seq == run_id {
            inner.running = false;
            inner.started_at = None;
            // Detach our own handle so stop() on a dead run is a no-op.
            inner.active = None;
        }
    }
    let _ = events.send(MonitorEvent::Stopped);
    tracing::info!(run_id, "monitor loop exited");
}
