//! Sheets + Drive implementations of the storage traits

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{AssetStore, ItemSource, RowSink, StorageError, StoredAsset};
use crate::db::settings;
use crate::google::{DriveClient, SheetsClient};
use ermihadu_common::model::{Item, NewItemRow, ITEM_COLUMNS};
use ermihadu_common::records::items_from_values;

/// Title of a spreadsheet created on first run
pub const SPREADSHEET_TITLE: &str = "ERMIHADU Items Database";

/// Tab holding the item rows
pub const ITEMS_TAB: &str = "Items";

/// Items read from and appended to one spreadsheet
pub struct SheetsBackend {
    client: SheetsClient,
    spreadsheet_id: String,
    items_range: String,
    append_range: String,
}

impl SheetsBackend {
    pub fn new(
        client: SheetsClient,
        spreadsheet_id: impl Into<String>,
        items_range: impl Into<String>,
        append_range: impl Into<String>,
    ) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            items_range: items_range.into(),
            append_range: append_range.into(),
        }
    }
}

#[async_trait]
impl ItemSource for SheetsBackend {
    async fn fetch_items(&self) -> Result<Vec<Item>, StorageError> {
        let rows = self
            .client
            .get_values(&self.spreadsheet_id, &self.items_range)
            .await?;
        Ok(items_from_values(&rows, &self.spreadsheet_id))
    }
}

#[async_trait]
impl RowSink for SheetsBackend {
    fn sheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    async fn append_row(&self, row: &NewItemRow) -> Result<(), StorageError> {
        self.client
            .append_row(&self.spreadsheet_id, &self.append_range, &row.to_cells())
            .await?;
        Ok(())
    }
}

/// Drive as the asset store; every upload is made public
pub struct DriveAssets {
    client: DriveClient,
}

impl DriveAssets {
    pub fn new(client: DriveClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AssetStore for DriveAssets {
    async fn upload(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<StoredAsset, StorageError> {
        Ok(self.client.upload_public(name, mime_type, bytes).await?.into())
    }
}

/// Resolve the spreadsheet to use
///
/// Order: configured id, then the id stored in the settings table, then a
/// newly created spreadsheet (whose id is stored for next time).
pub async fn get_or_create_spreadsheet(
    configured: Option<&str>,
    db: &SqlitePool,
    client: &SheetsClient,
) -> Result<String, StorageError> {
    if let Some(id) = configured.map(str::trim).filter(|id| !id.is_empty()) {
        tracing::info!(spreadsheet_id = %id, "Using configured spreadsheet");
        return Ok(id.to_string());
    }

    if let Some(id) = settings::get_sheet_id(db).await? {
        tracing::info!(spreadsheet_id = %id, "Using stored spreadsheet");
        return Ok(id);
    }

    tracing::info!("No spreadsheet known, creating \"{}\"", SPREADSHEET_TITLE);
    let id = client
        .create_spreadsheet(SPREADSHEET_TITLE, ITEMS_TAB, &ITEM_COLUMNS)
        .await?;
    settings::set_sheet_id(db, &id).await?;
    Ok(id)
}
