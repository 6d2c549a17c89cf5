//! Runtime configuration
//!
//! Reddit credentials come from the environment, matching how the
//! deployment injects them. Nothing here persists to disk.

use crate::error::{RedmonError, Result};

/// Default user agent; Reddit rejects generic client UAs.
pub const DEFAULT_USER_AGENT: &str = "redmon/0.1 (adaptive subreddit monitor)";

/// Credentials and identification for the Reddit API.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Config {
    /// Build a config from explicit credentials with the default user agent.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Override the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Load credentials from `REDDIT_CLIENT_ID` / `REDDIT_CLIENT_SECRET`,
    /// with an optional `REDMON_USER_AGENT` override.
    pub fn from_env() -> Result<Self> {
        let client_id = std::env::var("REDDIT_CLIENT_ID")
            .map_err(|_| RedmonError::InvalidArgument("REDDIT_CLIENT_ID is not set".to_string()))?;
        let client_secret = std::env::var("REDDIT_CLIENT_SECRET").map_err(|_| {
            RedmonError::InvalidArgument("REDDIT_CLIENT_SECRET is not set".to_string())
        })?;
        let user_agent =
            std::env::var("REDMON_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            client_id,
            client_secret,
            user_agent,
        })
    }
}
