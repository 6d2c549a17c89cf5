//! Reddit collaborators - OAuth, subreddit fetching, wire models
//!
//! Everything the monitor core treats as an external collaborator: the
//! HTTP client that performs one listing fetch per iteration, the
//! client-credentials token refresh it depends on, and the serde models
//! for the JSON that comes back.

pub mod auth;
pub mod client;
pub mod models;

pub use auth::{AuthToken, RedditAuth};
pub use client::{FetchResult, SubredditClient};
pub use models::{Listing, ListingData, Post, Thing};
