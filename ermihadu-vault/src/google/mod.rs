//! Google Sheets / Drive REST clients
//!
//! Thin wrappers over the endpoints the vault needs; no discovery
//! documents, no generic API surface.

pub mod auth;
pub mod drive;
pub mod sheets;

pub use auth::TokenProvider;
pub use drive::DriveClient;
pub use sheets::SheetsClient;

use std::time::Duration;
use thiserror::Error;

use ermihadu_common::config::GoogleConfig;

const USER_AGENT: &str = concat!("ermihadu-vault/", env!("CARGO_PKG_VERSION"));

/// Public, unauthenticated view URL of a Drive file
pub fn public_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=view&id={}", file_id)
}

/// Google client errors
#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for GoogleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GoogleError::Parse(err.to_string())
        } else {
            GoogleError::Network(err.to_string())
        }
    }
}

/// Base URLs of the Google services (overridable for tests)
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub sheets_base: String,
    pub drive_base: String,
    pub upload_base: String,
}

impl From<&GoogleConfig> for GoogleEndpoints {
    fn from(config: &GoogleConfig) -> Self {
        Self {
            sheets_base: config.sheets_base_url.trim_end_matches('/').to_string(),
            drive_base: config.drive_base_url.trim_end_matches('/').to_string(),
            upload_base: config.upload_base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Build the shared HTTP client
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, GoogleError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| GoogleError::Network(e.to_string()))
}

/// Turn a non-success response into `GoogleError::Api`
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GoogleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(GoogleError::Auth(format!("{}: {}", status, body)));
    }
    Err(GoogleError::Api(status.as_u16(), body))
}
