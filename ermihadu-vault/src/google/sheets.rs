//! Google Sheets values API client

use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{check_status, GoogleError, TokenProvider};

/// Sheets API client for one set of credentials
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    auth: Arc<TokenProvider>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSpreadsheet {
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(http: reqwest::Client, auth: Arc<TokenProvider>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            auth,
            base_url: base_url.into(),
        }
    }

    fn values_url(&self, spreadsheet_id: &str, range_segment: &str) -> Result<reqwest::Url, GoogleError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| GoogleError::Parse(format!("Invalid Sheets base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| GoogleError::Parse("Sheets base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", spreadsheet_id, "values", range_segment]);
        Ok(url)
    }

    /// Read a range as rows of strings
    ///
    /// Non-string cells (numbers, booleans) are rendered to text; a range
    /// with no data yields an empty list.
    pub async fn get_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, GoogleError> {
        let url = self.values_url(spreadsheet_id, range)?;
        let token = self.auth.bearer(&self.http).await?;

        tracing::debug!(spreadsheet_id = %spreadsheet_id, range = %range, "Reading sheet values");

        let response = self.http.get(url).bearer_auth(token).send().await?;
        let range: ValueRange = check_status(response).await?.json().await?;

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    /// Append one row after the last row of `range`
    pub async fn append_row(&self, spreadsheet_id: &str, range: &str, cells: &[String]) -> Result<(), GoogleError> {
        let mut url = self.values_url(spreadsheet_id, &format!("{}:append", range))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        let token = self.auth.bearer(&self.http).await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [cells] }))
            .send()
            .await?;
        check_status(response).await?;

        tracing::info!(spreadsheet_id = %spreadsheet_id, range = %range, "Appended row");
        Ok(())
    }

    /// Create a spreadsheet with one tab whose first row holds `headers`
    pub async fn create_spreadsheet(&self, title: &str, tab: &str, headers: &[&str]) -> Result<String, GoogleError> {
        let url = format!("{}/v4/spreadsheets", self.base_url.trim_end_matches('/'));
        let token = self.auth.bearer(&self.http).await?;

        let header_cells: Vec<Value> = headers
            .iter()
            .map(|h| json!({ "userEnteredValue": { "stringValue": h } }))
            .collect();
        let body = json!({
            "properties": { "title": title },
            "sheets": [{
                "properties": { "title": tab },
                "data": [{
                    "startRow": 0,
                    "startColumn": 0,
                    "rowData": [{ "values": header_cells }]
                }]
            }]
        });

        let response = self.http.post(url).bearer_auth(token).json(&body).send().await?;
        let created: CreatedSpreadsheet = check_status(response).await?.json().await?;

        tracing::info!(spreadsheet_id = %created.spreadsheet_id, "Created spreadsheet");
        Ok(created.spreadsheet_id)
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
