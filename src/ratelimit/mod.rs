//! Adaptive rate-limit tracking
//!
//! Converts the quota feedback Reddit returns on every response
//! (used/remaining/reset headers plus the measured cost of the call)
//! into an even-pacing delay for the next request.

pub mod tracker;

pub use tracker::{RateFeedback, RateSnapshot, RateTracker};
