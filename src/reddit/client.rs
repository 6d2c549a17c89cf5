//! Subreddit listing fetches plus quota-header parsing.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, USER_AGENT};

use crate::error::{RedmonError, Result};
use crate::ratelimit::RateFeedback;
use crate::reddit::auth::RedditAuth;
use crate::reddit::models::Listing;

const API_BASE: &str = "https://oauth.reddit.com";

/// A page of posts plus the quota headers that came with it.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub listing: Listing,
    pub feedback: RateFeedback,
}

/// Authenticated client for subreddit listing requests.
pub struct SubredditClient {
    http: reqwest::Client,
    auth: Arc<RedditAuth>,
    user_agent: String,
}

impl SubredditClient {
    pub fn new(http: reqwest::Client, auth: Arc<RedditAuth>, user_agent: String) -> Self {
        Self {
            http,
            auth,
            user_agent,
        }
    }

    /// Fetch the newest posts for a subreddit along with quota feedback.
    ///
    /// Quota headers are parsed even off failure responses: Reddit still
    /// charges throttled calls against the window.
    pub async fn fetch_new(&self, subreddit: &str) -> Result<FetchResult> {
        let subreddit = subreddit.trim();
        if subreddit.is_empty() {
            return Err(RedmonError::InvalidArgument(
                "subreddit name is empty".to_string(),
            ));
        }

        let token = self.auth.bearer_token().await?;
        let url = format!("{API_BASE}/r/{subreddit}/new.json");

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let feedback = parse_rate_headers(response.headers());
        let status = response.status();

        if !status.is_success() {
            return Err(RedmonError::WorkUnit(format!(
                "fetching r/{subreddit} returned {status}"
            )));
        }

        let listing: Listing = response.json().await?;
        tracing::debug!(
            subreddit,
            posts = listing.data.children.len(),
            remaining = feedback.remaining,
            "fetched subreddit listing"
        );

        Ok(FetchResult { listing, feedback })
    }
}

/// Parse the `x-ratelimit-*` trio; anything missing or malformed reads as 0.
///
/// `x-ratelimit-remaining` is a decimal string ("99.0") and gets floored.
pub fn parse_rate_headers(headers: &HeaderMap) -> RateFeedback {
    RateFeedback {
        used: header_int(headers, "x-ratelimit-used"),
        remaining: header_float(headers, "x-ratelimit-remaining").floor() as i64,
        reset_seconds: header_int(headers, "x-ratelimit-reset"),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_int(headers: &HeaderMap, name: &str) -> i64 {
    header_str(headers, name)
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

fn header_float(headers: &HeaderMap, name: &str) -> f64 {
    header_str(headers, name)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}
