//! Rate tracker - even pacing over the remaining quota window.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{RedmonError, Result};

/// Raw quota feedback returned by one work-unit invocation.
///
/// Values are signed because they come straight off response headers,
/// which occasionally report noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateFeedback {
    /// Requests consumed in the current window (`x-ratelimit-used`)
    pub used: i64,
    /// Requests left before throttling (`x-ratelimit-remaining`)
    pub remaining: i64,
    /// Seconds until the quota window resets (`x-ratelimit-reset`)
    pub reset_seconds: i64,
}

/// Point-in-time view of the quota window.
///
/// Replaced wholesale on every update; never merged field by field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSnapshot {
    /// Requests consumed in the current window
    pub used: u64,
    /// Requests left before throttling
    pub remaining: u64,
    /// Time until the quota resets
    pub reset_window: Duration,
    /// Wall-clock cost of the most recent work-unit invocation
    pub last_call_duration: Duration,
    /// When this snapshot was recorded
    pub observed_at: DateTime<Utc>,
}

impl Default for RateSnapshot {
    fn default() -> Self {
        // Reddit's documented ceiling: 100 requests per 60-second window.
        Self {
            used: 0,
            remaining: 100,
            reset_window: Duration::from_secs(60),
            last_call_duration: Duration::ZERO,
            observed_at: Utc::now(),
        }
    }
}

/// Stateful adaptive-delay calculator.
///
/// Owns the current [`RateSnapshot`] and turns it into a delay that,
/// honored every iteration, spreads the remaining permitted calls evenly
/// across the rest of the reset window.
#[derive(Debug)]
pub struct RateTracker {
    snapshot: Mutex<RateSnapshot>,
}

impl RateTracker {
    /// Create a tracker seeded with the default quota assumptions.
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(RateSnapshot::default()),
        }
    }

    /// Replace the current snapshot with fresh feedback.
    ///
    /// A negative `used` count is rejected as [`RedmonError::InvalidFeedback`];
    /// negative `remaining`/`reset_seconds` are clamped to zero since the
    /// upstream headers are occasionally noisy.
    pub fn update(&self, feedback: RateFeedback, last_call_duration: Duration) -> Result<()> {
        if feedback.used < 0 {
            return Err(RedmonError::InvalidFeedback(format!(
                "negative used count: {}",
                feedback.used
            )));
        }

        let snapshot = RateSnapshot {
            used: feedback.used as u64,
            remaining: feedback.remaining.max(0) as u64,
            reset_window: Duration::from_secs(feedback.reset_seconds.max(0) as u64),
            last_call_duration,
            observed_at: Utc::now(),
        };

        tracing::debug!(
            used = snapshot.used,
            remaining = snapshot.remaining,
            reset_secs = snapshot.reset_window.as_secs(),
            "rate limits updated"
        );

        *self.snapshot.lock() = snapshot;
        Ok(())
    }

    /// Compute the even-pacing delay for the current snapshot.
    pub fn compute_delay(&self) -> Duration {
        let snapshot = self.snapshot.lock().clone();
        Self::delay_for(&snapshot)
    }

    /// Pure delay calculation for a snapshot, in whole milliseconds.
    fn delay_for(snapshot: &RateSnapshot) -> Duration {
        let adjusted = snapshot.reset_window.saturating_sub(snapshot.last_call_duration);

        if adjusted.is_zero() || snapshot.remaining == 0 {
            // No further calls are safe before the window truly resets, so
            // wait out the raw reset period rather than the adjusted one.
            return snapshot.reset_window;
        }

        Duration::from_millis((adjusted.as_millis() / snapshot.remaining as u128) as u64)
    }

    /// Sleep for the computed delay, or until `cancel` fires.
    ///
    /// A zero delay returns immediately without suspending. Cancellation
    /// interrupts the sleep right away and surfaces as
    /// [`RedmonError::Cancelled`].
    pub async fn apply_delay(&self, cancel: &CancellationToken) -> Result<()> {
        let delay = self.compute_delay();
        if delay.is_zero() {
            return Ok(());
        }

        tracing::debug!(delay_ms = delay.as_millis() as u64, "pacing next request");

        tokio::select! {
            _ = cancel.cancelled() => Err(RedmonError::Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }

    /// Copy of the current quota state, for observability.
    pub fn snapshot(&self) -> RateSnapshot {
        self.snapshot.lock().clone()
    }
}

impl Default for RateTracker {
    fn default() -> Self {
        Self::new()
    }
}
