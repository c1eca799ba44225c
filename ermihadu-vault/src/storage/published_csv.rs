//! Read-only item source over a published CSV export

use async_trait::async_trait;

use super::{ItemSource, StorageError};
use crate::google::{check_status, GoogleError};
use ermihadu_common::model::Item;
use ermihadu_common::records::{items_from_records, parse_csv, ParseOptions};

/// Items read from the sheet's "publish to web" CSV link
///
/// Writes still go through the Sheets API; this only replaces the read.
pub struct PublishedCsvSource {
    http: reqwest::Client,
    url: String,
    sheet_id: String,
}

impl PublishedCsvSource {
    pub fn new(http: reqwest::Client, url: impl Into<String>, sheet_id: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            sheet_id: sheet_id.into(),
        }
    }
}

#[async_trait]
impl ItemSource for PublishedCsvSource {
    async fn fetch_items(&self) -> Result<Vec<Item>, StorageError> {
        tracing::debug!(url = %self.url, "Fetching published CSV");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(GoogleError::from)?;
        let text = check_status(response)
            .await?
            .text()
            .await
            .map_err(GoogleError::from)?;

        let records = parse_csv(&text, ParseOptions::default())?;
        Ok(items_from_records(&records, &self.sheet_id))
    }
}
