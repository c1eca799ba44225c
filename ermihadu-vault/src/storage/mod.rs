//! Storage seams for the vault
//!
//! Three roles, each behind a trait so handlers and the upload pipeline
//! never talk to Google directly:
//! - [`ItemSource`]: read the item list
//! - [`AssetStore`]: store a binary asset and publish it
//! - [`RowSink`]: append one item row

pub mod published_csv;
pub mod sheets;

pub use published_csv::PublishedCsvSource;
pub use sheets::{get_or_create_spreadsheet, DriveAssets, SheetsBackend};

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::google::drive::PublicFile;
use crate::google::{http_client, DriveClient, GoogleEndpoints, GoogleError, SheetsClient, TokenProvider};
use ermihadu_common::config::{SourceKind, TomlConfig};
use ermihadu_common::model::{Item, NewItemRow};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Google(#[from] GoogleError),

    #[error(transparent)]
    Common(#[from] ermihadu_common::Error),

    /// Backend missing credentials or configuration
    #[error("Storage not configured: {0}")]
    NotConfigured(String),
}

/// An uploaded asset as recorded on the item row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub id: String,
    pub url: String,
}

impl From<PublicFile> for StoredAsset {
    fn from(file: PublicFile) -> Self {
        Self {
            id: file.id,
            url: file.url,
        }
    }
}

#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Every item, ids assigned in row order
    async fn fetch_items(&self) -> Result<Vec<Item>, StorageError>;
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `name` and make it publicly readable
    async fn upload(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<StoredAsset, StorageError>;
}

#[async_trait]
pub trait RowSink: Send + Sync {
    /// Spreadsheet id written into the row's `Sheet ID` column
    fn sheet_id(&self) -> &str;

    async fn append_row(&self, row: &NewItemRow) -> Result<(), StorageError>;
}

/// The three storage roles wired together
#[derive(Clone)]
pub struct Backends {
    pub source: Arc<dyn ItemSource>,
    pub assets: Arc<dyn AssetStore>,
    pub rows: Arc<dyn RowSink>,
}

impl Backends {
    /// Backends that fail every call, for running without credentials
    pub fn unconfigured(reason: impl Into<String>) -> Self {
        let backend = Arc::new(Unconfigured(reason.into()));
        Self {
            source: backend.clone(),
            assets: backend.clone(),
            rows: backend,
        }
    }
}

/// Wire the Google-backed storage from configuration
///
/// Resolves (or creates) the spreadsheet. With `source.kind =
/// "published_csv"` the item list is read from the CSV export instead of
/// the values API; writes always go through Sheets and Drive.
pub async fn connect(config: &TomlConfig, db: &SqlitePool) -> Result<Backends, StorageError> {
    let auth = Arc::new(TokenProvider::from_config(&config.google)?);
    let http = http_client(Duration::from_secs(config.google.request_timeout_secs))?;
    let endpoints = GoogleEndpoints::from(&config.google);

    let sheets = SheetsClient::new(http.clone(), auth.clone(), endpoints.sheets_base);
    let drive = DriveClient::new(http.clone(), auth, endpoints.drive_base, endpoints.upload_base);

    let spreadsheet_id =
        get_or_create_spreadsheet(config.google.spreadsheet_id.as_deref(), db, &sheets).await?;

    let backend = Arc::new(SheetsBackend::new(
        sheets,
        spreadsheet_id.clone(),
        config.source.items_range.clone(),
        config.source.append_range.clone(),
    ));

    let source: Arc<dyn ItemSource> = match config.source.kind {
        SourceKind::Sheets => backend.clone(),
        SourceKind::PublishedCsv => Arc::new(PublishedCsvSource::new(
            http,
            config.source.csv_url.clone().unwrap_or_default(),
            spreadsheet_id,
        )),
    };

    Ok(Backends {
        source,
        assets: Arc::new(DriveAssets::new(drive)),
        rows: backend,
    })
}

/// [`connect`], degrading instead of failing
///
/// Without working credentials the service still starts: reads come from
/// the published CSV if one is configured, everything else reports the
/// connection error.
pub async fn connect_or_degrade(config: &TomlConfig, db: &SqlitePool) -> Backends {
    match connect(config, db).await {
        Ok(backends) => backends,
        Err(e) => {
            tracing::error!("Google storage unavailable: {}", e);
            let mut backends = Backends::unconfigured(e.to_string());
            if let (SourceKind::PublishedCsv, Some(url)) = (config.source.kind, &config.source.csv_url) {
                match http_client(Duration::from_secs(config.google.request_timeout_secs)) {
                    Ok(http) => {
                        tracing::info!("Reading items from published CSV only");
                        let sheet_id = config.google.spreadsheet_id.clone().unwrap_or_default();
                        backends.source = Arc::new(PublishedCsvSource::new(http, url.clone(), sheet_id));
                    }
                    Err(e) => tracing::error!("HTTP client unavailable: {}", e),
                }
            }
            backends
        }
    }
}

/// Stand-in used when Google credentials are missing
///
/// The UI still renders (empty list, error banner) instead of the service
/// refusing to start.
#[derive(Debug)]
pub struct Unconfigured(String);

#[async_trait]
impl ItemSource for Unconfigured {
    async fn fetch_items(&self) -> Result<Vec<Item>, StorageError> {
        Err(StorageError::NotConfigured(self.0.clone()))
    }
}

#[async_trait]
impl AssetStore for Unconfigured {
    async fn upload(&self, _name: &str, _mime_type: &str, _bytes: Vec<u8>) -> Result<StoredAsset, StorageError> {
        Err(StorageError::NotConfigured(self.0.clone()))
    }
}

#[async_trait]
impl RowSink for Unconfigured {
    fn sheet_id(&self) -> &str {
        ""
    }

    async fn append_row(&self, _row: &NewItemRow) -> Result<(), StorageError> {
        Err(StorageError::NotConfigured(self.0.clone()))
    }
}
