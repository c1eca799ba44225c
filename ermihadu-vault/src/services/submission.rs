//! Two-phase submission: upload assets, then append one row
//!
//! Images upload concurrently; the audio upload and the row append wait
//! for all of them. The first failure aborts the rest and no row is
//! appended. Assets already uploaded by a failed attempt stay in Drive.

use futures::future::try_join_all;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::refresh_for_view;
use crate::storage::{AssetStore, RowSink, StorageError, StoredAsset};
use crate::AppState;
use ermihadu_common::draft::{Submission, ValidationError};
use ermihadu_common::events::VaultEvent;
use ermihadu_common::model::NewItemRow;
use ermihadu_common::time::{now, to_row_timestamp};
use ermihadu_common::view::{Action, ViewState};

/// Inline message shown for any upload or append failure
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading item. Please try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Required fields missing; no network call was made
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("An upload is already in progress")]
    Busy,

    #[error("Uploading {file_name} failed: {source}")]
    AssetUpload {
        file_name: String,
        #[source]
        source: StorageError,
    },

    #[error("Appending the item row failed: {0}")]
    RowAppend(#[source] StorageError),
}

impl SubmitError {
    /// Text for the inline status banner
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(e) => e.to_string(),
            SubmitError::Busy => self.to_string(),
            SubmitError::AssetUpload { .. } | SubmitError::RowAppend(_) => {
                UPLOAD_FAILED_MESSAGE.to_string()
            }
        }
    }
}

/// `{title}_{index}_{unix_millis}.{ext}`
pub fn image_file_name(title: &str, index: usize, unix_millis: i64, extension: &str) -> String {
    format!("{}_{}_{}.{}", title, index, unix_millis, extension)
}

/// `{title}_audio_{unix_millis}.webm`
pub fn audio_file_name(title: &str, unix_millis: i64) -> String {
    format!("{}_audio_{}.webm", title, unix_millis)
}

async fn upload_one(
    assets: &dyn AssetStore,
    file_name: String,
    mime_type: &str,
    bytes: Vec<u8>,
) -> Result<StoredAsset, SubmitError> {
    assets
        .upload(&file_name, mime_type, bytes)
        .await
        .map_err(|source| SubmitError::AssetUpload { file_name, source })
}

/// Upload a validated submission's assets and append its row
///
/// Returns the appended row.
pub async fn upload_submission(
    submission: &Submission,
    assets: &dyn AssetStore,
    rows: &dyn RowSink,
) -> Result<NewItemRow, SubmitError> {
    let millis = now().timestamp_millis();

    let images = try_join_all(submission.images.iter().enumerate().map(|(idx, image)| {
        let file_name = image_file_name(&submission.title, idx, millis, image.extension());
        upload_one(assets, file_name, &image.mime_type, image.bytes.clone())
    }))
    .await?;

    let audio = match &submission.audio {
        Some(clip) => Some(
            upload_one(
                assets,
                audio_file_name(&submission.title, millis),
                &clip.mime_type,
                clip.bytes.clone(),
            )
            .await?,
        ),
        None => None,
    };
    let (audio_url, drive_audio_id) = audio.map(|a| (a.url, a.id)).unwrap_or_default();

    let row = NewItemRow {
        timestamp: to_row_timestamp(now()),
        title: submission.title.clone(),
        person: submission.person.clone(),
        size: submission.size,
        description: submission.description.clone(),
        image_urls: images.iter().map(|a| a.url.clone()).collect(),
        audio_url,
        audio_transcript: submission.audio_transcript.clone(),
        uploader: submission.uploader.clone(),
        drive_image_ids: images.into_iter().map(|a| a.id).collect(),
        drive_audio_id,
        sheet_id: rows.sheet_id().to_string(),
    };

    rows.append_row(&row).await.map_err(SubmitError::RowAppend)?;
    Ok(row)
}

/// Validate a browser's draft and run the whole submission
///
/// Validation failure and a concurrent submission (from this browser or
/// any other) are rejected before any network call. On success the person
/// joins the shared people list, the draft is cleared, the list is
/// refetched and the list page is shown.
pub async fn submit_draft(state: &AppState, view: &RwLock<ViewState>) -> Result<NewItemRow, SubmitError> {
    let (submission, _guard) = {
        let mut view = view.write().await;
        if view.uploading {
            return Err(SubmitError::Busy);
        }

        let submission = match view.draft.validate() {
            Ok(submission) => submission,
            Err(e) => {
                warn!("Submission rejected: {}", e);
                // ValidationFailed never rejects
                let _ = view.apply(Action::ValidationFailed(e.to_string()));
                return Err(e.into());
            }
        };

        let guard = state
            .submission_guard
            .clone()
            .try_lock_owned()
            .map_err(|_| SubmitError::Busy)?;
        view.apply(Action::SubmissionStarted)
            .map_err(|_| SubmitError::Busy)?;
        (submission, guard)
    };

    let submission_id = Uuid::new_v4();
    info!(
        %submission_id,
        title = %submission.title,
        image_count = submission.images.len(),
        has_audio = submission.audio.is_some(),
        "Submission started"
    );
    state.event_bus.emit_lossy(VaultEvent::SubmissionStarted {
        submission_id,
        image_count: submission.images.len(),
        has_audio: submission.audio.is_some(),
    });

    let result = upload_submission(
        &submission,
        state.backends.assets.as_ref(),
        state.backends.rows.as_ref(),
    )
    .await;

    match result {
        Ok(row) => {
            info!(%submission_id, "Submission appended");
            if state.catalog.write().await.add_person(&submission.person) {
                info!(person = %submission.person, "New person added");
            }
            let _ = view.write().await.apply(Action::SubmissionSucceeded {
                title: submission.title.clone(),
            });
            state.event_bus.emit_lossy(VaultEvent::SubmissionSucceeded {
                submission_id,
                title: submission.title,
            });
            // A failed refetch is reported to this browser; the row is appended either way
            let _ = refresh_for_view(state, view).await;
            Ok(row)
        }
        Err(e) => {
            error!(%submission_id, "Submission failed: {}", e);
            state.record_error(e.to_string()).await;
            let _ = view.write().await.apply(Action::SubmissionFailed(e.user_message()));
            state.event_bus.emit_lossy(VaultEvent::SubmissionFailed {
                submission_id,
                message: e.to_string(),
            });
            Err(e)
        }
    }
}
