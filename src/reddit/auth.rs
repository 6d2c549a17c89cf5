//! Reddit OAuth client-credentials flow with cached token refresh.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::{RedmonError, Result};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Access token returned by the client-credentials grant.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: String,
    #[serde(skip_deserializing, default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Whether the token's lifetime has elapsed.
    pub fn is_expired(&self) -> bool {
        self.created_at + ChronoDuration::seconds(self.expires_in) < Utc::now()
    }
}

/// Fetches and caches the bearer token used for listing requests.
pub struct RedditAuth {
    http: reqwest::Client,
    config: Config,
    // tokio Mutex: held across the refresh await so concurrent callers
    // don't stampede the token endpoint.
    token: Mutex<Option<AuthToken>>,
}

impl RedditAuth {
    pub fn new(http: reqwest::Client, config: Config) -> Self {
        Self {
            http,
            config,
            token: Mutex::new(None),
        }
    }

    /// Return a valid access token, refreshing when missing or expired.
    pub async fn bearer_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.refresh().await?;
        let access = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access)
    }

    async fn refresh(&self) -> Result<AuthToken> {
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));

        let response = self
            .http
            .post(TOKEN_URL)
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .header(USER_AGENT, &self.config.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RedmonError::Auth(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let mut token: AuthToken = response.json().await?;
        token.created_at = Utc::now();

        if token.access_token.is_empty() {
            return Err(RedmonError::Auth("token endpoint returned an empty access token".to_string()));
        }

        tracing::info!(expires_in = token.expires_in, "refreshed reddit access token");
        Ok(token)
    }
}
