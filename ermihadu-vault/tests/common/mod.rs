//! In-memory storage fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ermihadu_common::events::EventBus;
use ermihadu_common::model::{Item, ItemId, NewItemRow};
use ermihadu_common::People;
use ermihadu_vault::storage::{AssetStore, Backends, ItemSource, RowSink, StorageError, StoredAsset};
use ermihadu_vault::AppState;

/// A spreadsheet held in memory: appended rows become fetchable items
#[derive(Default)]
pub struct FakeSheet {
    pub rows: Mutex<Vec<NewItemRow>>,
    pub fail_fetch: Mutex<bool>,
    pub fail_append: Mutex<bool>,
    pub fetch_calls: AtomicUsize,
    pub append_calls: AtomicUsize,
}

impl FakeSheet {
    pub fn with_rows(rows: Vec<NewItemRow>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ItemSource for FakeSheet {
    async fn fetch_items(&self) -> Result<Vec<Item>, StorageError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_fetch.lock().unwrap() {
            return Err(StorageError::NotConfigured("fetch disabled".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(idx, row)| Item::from_row(ItemId(idx), &row.to_cells(), "fake-sheet"))
            .collect())
    }
}

#[async_trait]
impl RowSink for FakeSheet {
    fn sheet_id(&self) -> &str {
        "fake-sheet"
    }

    async fn append_row(&self, row: &NewItemRow) -> Result<(), StorageError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_append.lock().unwrap() {
            return Err(StorageError::NotConfigured("append disabled".into()));
        }
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}

/// Asset store that records every upload
#[derive(Default)]
pub struct FakeAssets {
    pub uploads: Mutex<Vec<(String, String, usize)>>,
    /// Fail any upload whose name contains this text
    pub fail_on: Mutex<Option<String>>,
}

#[async_trait]
impl AssetStore for FakeAssets {
    async fn upload(&self, name: &str, mime_type: &str, bytes: Vec<u8>) -> Result<StoredAsset, StorageError> {
        if let Some(pattern) = self.fail_on.lock().unwrap().as_deref() {
            if name.contains(pattern) {
                return Err(StorageError::NotConfigured(format!("upload of {} refused", name)));
            }
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((name.to_string(), mime_type.to_string(), bytes.len()));
        let id = format!("file-{}", uploads.len());
        Ok(StoredAsset {
            url: format!("https://drive.google.com/uc?export=view&id={}", id),
            id,
        })
    }
}

impl FakeAssets {
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

pub struct Harness {
    pub state: AppState,
    pub sheet: Arc<FakeSheet>,
    pub assets: Arc<FakeAssets>,
}

pub fn harness_with(sheet: FakeSheet) -> Harness {
    let sheet = Arc::new(sheet);
    let assets = Arc::new(FakeAssets::default());
    let backends = Backends {
        source: sheet.clone(),
        assets: assets.clone(),
        rows: sheet.clone(),
    };
    let state = AppState::new(backends, People::default(), EventBus::new(100));
    Harness { state, sheet, assets }
}

pub fn harness() -> Harness {
    harness_with(FakeSheet::default())
}

pub fn row(title: &str, person: &str, size: ermihadu_common::Size, timestamp: &str) -> NewItemRow {
    NewItemRow {
        timestamp: timestamp.to_string(),
        title: title.to_string(),
        person: person.to_string(),
        size,
        description: String::new(),
        image_urls: vec![],
        audio_url: String::new(),
        audio_transcript: String::new(),
        uploader: "ER".to_string(),
        drive_image_ids: vec![],
        drive_audio_id: String::new(),
        sheet_id: "fake-sheet".to_string(),
    }
}
