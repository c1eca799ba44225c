//! Audio recording endpoints
//!
//! The page owns the microphone (MediaRecorder). It calls `start`, posts
//! each encoded chunk, then `stop`; the clip lands in that browser's draft. A denied
//! permission prompt is reported through `denied`.

use axum::{
    body::Bytes,
    extract::Query,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::{ApiError, ApiResult, AppState};
use ermihadu_common::view::Action;

#[derive(Debug, Default, Deserialize)]
pub struct StartQuery {
    /// Container type reported by MediaRecorder
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordingStatus {
    pub recording: bool,
    /// Size of the clip held by the draft
    pub clip_bytes: Option<usize>,
}

pub fn audio_routes() -> Router<AppState> {
    Router::new()
        .route("/api/audio/start", post(start_recording))
        .route("/api/audio/chunk", post(push_chunk))
        .route("/api/audio/stop", post(stop_recording))
        .route("/api/audio/denied", post(microphone_denied))
        .route("/api/audio/discard", post(discard_audio))
        .route("/api/audio/clip", get(get_clip))
}

async fn status(session: &Session) -> RecordingStatus {
    let view = session.view.read().await;
    RecordingStatus {
        recording: view.recorder.is_recording(),
        clip_bytes: view.draft.audio.as_ref().map(|clip| clip.bytes.len()),
    }
}

/// POST /api/audio/start (409 while already recording)
pub async fn start_recording(
    session: Session,
    Query(query): Query<StartQuery>,
) -> ApiResult<Json<RecordingStatus>> {
    session
        .dispatch(Action::RecordingStarted {
            mime_type: query.mime_type,
        })
        .await?;
    Ok(Json(status(&session).await))
}

/// POST /api/audio/chunk (409 when not recording)
pub async fn push_chunk(session: Session, body: Bytes) -> ApiResult<StatusCode> {
    session.dispatch(Action::RecordingChunk(body.to_vec())).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/audio/stop (no-op while idle)
pub async fn stop_recording(session: Session) -> ApiResult<Json<RecordingStatus>> {
    session.dispatch(Action::RecordingStopped).await?;
    Ok(Json(status(&session).await))
}

/// POST /api/audio/denied
pub async fn microphone_denied(session: Session) -> ApiResult<StatusCode> {
    tracing::warn!("Microphone access denied by the browser");
    session.dispatch(Action::MicrophoneDenied).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/audio/discard
pub async fn discard_audio(session: Session) -> ApiResult<StatusCode> {
    session.dispatch(Action::DiscardAudio).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/audio/clip
pub async fn get_clip(session: Session) -> ApiResult<Response> {
    let view = session.view.read().await;
    let clip = view
        .draft
        .audio
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("No recorded clip".to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, clip.mime_type.clone())],
        clip.bytes.clone(),
    )
        .into_response())
}
