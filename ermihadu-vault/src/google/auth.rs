//! Bearer token supply for Google API calls
//!
//! Either a fixed access token, or a refresh token exchanged at the token
//! endpoint and cached until shortly before it expires. No interactive
//! OAuth flow lives here.

use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{check_status, GoogleError};
use ermihadu_common::config::GoogleConfig;

/// Refresh this long before the reported expiry
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct RefreshCredentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_url: String,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Supplies the `Authorization: Bearer` token
#[derive(Debug)]
pub struct TokenProvider {
    static_token: Option<String>,
    refresh: Option<RefreshCredentials>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    /// Fixed token, never refreshed
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            static_token: Some(token.into()),
            refresh: None,
            cached: Mutex::new(None),
        }
    }

    /// Build from configuration; refresh credentials win over a fixed token
    pub fn from_config(config: &GoogleConfig) -> Result<Self, GoogleError> {
        let refresh = match (&config.client_id, &config.client_secret, &config.refresh_token) {
            (Some(id), Some(secret), Some(token)) => Some(RefreshCredentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
                refresh_token: token.clone(),
                token_url: config.token_url.clone(),
            }),
            _ => None,
        };

        if refresh.is_none() && config.access_token.is_none() {
            return Err(GoogleError::Auth(
                "No Google credentials configured: set google.access_token or \
                 google.client_id + google.client_secret + google.refresh_token"
                    .to_string(),
            ));
        }

        Ok(Self {
            static_token: config.access_token.clone(),
            refresh,
            cached: Mutex::new(None),
        })
    }

    /// Current bearer token, refreshing if needed
    pub async fn bearer(&self, http: &reqwest::Client) -> Result<String, GoogleError> {
        let Some(credentials) = &self.refresh else {
            return self
                .static_token
                .clone()
                .ok_or_else(|| GoogleError::Auth("No access token".to_string()));
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        tracing::debug!("Refreshing Google access token");
        let response = http
            .post(&credentials.token_url)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let token: TokenResponse = check_status(response)
            .await
            .map_err(|e| GoogleError::Auth(format!("Token refresh failed: {}", e)))?
            .json()
            .await?;

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }
}
