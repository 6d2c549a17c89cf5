//! Redmon - adaptive-rate subreddit monitoring
//!
//! Pairs an adaptive rate-limit tracker with a supervised polling loop:
//! each iteration calls the Reddit API once, feeds the quota headers from
//! the response into the tracker, and sleeps for the computed even-pacing
//! delay before the next call. The loop can be started, stopped, and
//! inspected from concurrent callers and publishes lifecycle events to
//! any number of subscribers.

pub mod config;
pub mod error;
pub mod monitor;
pub mod ratelimit;
pub mod reddit;
pub mod stats;

pub use error::{RedmonError, Result};
