//! Google Drive upload client

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{check_status, public_url, GoogleError, TokenProvider};

/// A file stored in Drive and readable by anyone with the link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicFile {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Clone)]
pub struct DriveClient {
    http: reqwest::Client,
    auth: Arc<TokenProvider>,
    drive_base: String,
    upload_base: String,
}

impl DriveClient {
    pub fn new(
        http: reqwest::Client,
        auth: Arc<TokenProvider>,
        drive_base: impl Into<String>,
        upload_base: impl Into<String>,
    ) -> Self {
        Self {
            http,
            auth,
            drive_base: drive_base.into(),
            upload_base: upload_base.into(),
        }
    }

    /// Multipart upload: JSON metadata part plus the file content
    pub async fn upload(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<String, GoogleError> {
        let url = format!(
            "{}/upload/drive/v3/files?uploadType=multipart",
            self.upload_base.trim_end_matches('/')
        );
        let token = self.auth.bearer(&self.http).await?;

        let metadata = json!({ "name": name, "mimeType": mime_type }).to_string();
        let size = bytes.len();
        let form = Form::new()
            .part(
                "metadata",
                Part::text(metadata)
                    .mime_str("application/json")
                    .map_err(|e| GoogleError::Parse(e.to_string()))?,
            )
            .part(
                "file",
                Part::bytes(bytes)
                    .file_name(name.to_string())
                    .mime_str(mime_type)
                    .map_err(|e| GoogleError::Parse(format!("Invalid mime type {}: {}", mime_type, e)))?,
            );

        let response = self.http.post(url).bearer_auth(token).multipart(form).send().await?;
        let created: CreatedFile = check_status(response).await?.json().await?;

        tracing::debug!(file_id = %created.id, name = %name, bytes = size, "Uploaded file to Drive");
        Ok(created.id)
    }

    /// Grant "anyone: reader" on a file
    pub async fn make_public(&self, file_id: &str) -> Result<(), GoogleError> {
        let url = format!(
            "{}/drive/v3/files/{}/permissions",
            self.drive_base.trim_end_matches('/'),
            file_id
        );
        let token = self.auth.bearer(&self.http).await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Upload, publish, and return the id and public URL
    pub async fn upload_public(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<PublicFile, GoogleError> {
        let id = self.upload(name, mime_type, bytes).await?;
        self.make_public(&id).await?;
        Ok(PublicFile {
            url: public_url(&id),
            id,
        })
    }
}
