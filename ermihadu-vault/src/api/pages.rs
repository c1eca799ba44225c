//! Server-rendered pages and the form posts that drive them
//!
//! Every handler acts on the requesting browser's view, then either renders
//! the current page or redirects back to `/` (post/redirect/get).

use axum::{
    extract::{Multipart, Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use super::items::FilterQuery;
use crate::render::render_page;
use crate::services::{refresh_for_view, submit_draft, SubmitError};
use crate::session::Session;
use crate::{ApiError, ApiResult, AppState};
use ermihadu_common::draft::{Attachment, PersonChoice};
use ermihadu_common::view::{Action, DraftFields, Page};
use ermihadu_common::{ItemId, Size, UploaderLabel};

/// Query accepted by `/`
///
/// `expand` and `collapse` set state rather than toggle it, so reloading
/// the same URL renders the same page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub size: Option<String>,
    pub recency: Option<String>,
    pub person: Option<String>,
    pub expand: Option<usize>,
    pub collapse: Option<usize>,
}

impl PageQuery {
    fn filters(&self) -> FilterQuery {
        FilterQuery {
            size: self.size.clone(),
            recency: self.recency.clone(),
            person: self.person.clone(),
        }
    }
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/upload", get(open_form))
        .route("/cancel", post(cancel))
        .route("/draft", post(save_draft))
        .route("/draft/images/:index", get(draft_image))
        .route("/submit", post(submit))
        .route("/refresh", post(refresh))
        .route("/dismiss", post(dismiss))
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let mut view = session.view.write().await;

    let filter_query = query.filters();
    if !filter_query.is_empty() {
        let filters = filter_query.merge_into(&view.filters)?;
        view.apply(Action::SetFilters(filters))?;
    }
    if let Some(id) = query.expand {
        view.apply(Action::Expand(ItemId(id)))?;
    }
    if let Some(id) = query.collapse {
        view.apply(Action::Collapse(ItemId(id)))?;
    }

    let catalog = state.catalog.read().await;
    Ok(Html(render_page(&view, &catalog)))
}

/// GET /upload
pub async fn open_form(session: Session) -> ApiResult<Redirect> {
    session.dispatch(Action::Navigate(Page::Form)).await?;
    Ok(Redirect::to("/"))
}

/// POST /cancel: leaving the form discards the draft
pub async fn cancel(session: Session) -> ApiResult<Redirect> {
    session.dispatch(Action::Navigate(Page::List)).await?;
    Ok(Redirect::to("/"))
}

/// POST /draft: keep the typed fields, optionally removing an image or
/// toggling an uploader label
pub async fn save_draft(session: Session, multipart: Multipart) -> ApiResult<Redirect> {
    let form = read_draft_form(multipart).await?;

    let mut view = session.view.write().await;
    if view.uploading {
        return Err(ApiError::Conflict("An upload is already in progress".to_string()));
    }
    view.apply(Action::EditDraft(form.fields))?;
    if let Some(index) = form.remove_image {
        view.apply(Action::RemoveImage(index))?;
    }
    if let Some(label) = form.toggle_uploader {
        view.apply(Action::ToggleUploader(label))?;
    }
    Ok(Redirect::to("/"))
}

/// POST /submit
///
/// Validation and upload failures come back as the inline banner; only a
/// submission racing another one is an HTTP error (409).
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> ApiResult<Redirect> {
    let form = read_draft_form(multipart).await?;

    {
        let mut view = session.view.write().await;
        if view.uploading {
            return Err(ApiError::Conflict("An upload is already in progress".to_string()));
        }
        view.apply(Action::EditDraft(form.fields))?;
    }

    match submit_draft(&state, &session.view).await {
        Ok(_) => Ok(Redirect::to("/")),
        Err(SubmitError::Busy) => Err(ApiError::Conflict(SubmitError::Busy.to_string())),
        Err(_) => Ok(Redirect::to("/")),
    }
}

/// POST /refresh
pub async fn refresh(State(state): State<AppState>, session: Session) -> Redirect {
    // Failures land in this browser's banner and in last_error
    let _ = refresh_for_view(&state, &session.view).await;
    Redirect::to("/")
}

/// POST /dismiss: hide the status banner
pub async fn dismiss(session: Session) -> ApiResult<Redirect> {
    session.dispatch(Action::DismissStatus).await?;
    Ok(Redirect::to("/"))
}

/// GET /draft/images/:index: preview of a selected image
pub async fn draft_image(session: Session, Path(index): Path<usize>) -> ApiResult<Response> {
    let view = session.view.read().await;
    let image = view
        .draft
        .images
        .get(index)
        .ok_or_else(|| ApiError::NotFound(format!("No draft image {}", index)))?;

    Ok((
        [(header::CONTENT_TYPE, image.mime_type.clone())],
        image.bytes.clone(),
    )
        .into_response())
}

/// Decoded upload form
#[derive(Debug, Default)]
pub struct DraftForm {
    pub fields: DraftFields,
    pub remove_image: Option<usize>,
    pub toggle_uploader: Option<UploaderLabel>,
}

/// Read the multipart upload form
///
/// Uploader labels arrive as repeated `uploader` fields in selection order.
/// File inputs left empty by the browser (no name, no bytes) are skipped.
pub async fn read_draft_form(mut multipart: Multipart) -> ApiResult<DraftForm> {
    let mut form = DraftForm::default();
    let mut selected_person = String::new();
    let mut new_person = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "images" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Reading {} failed: {}", file_name, e)))?;
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            form.fields.new_images.push(Attachment {
                file_name,
                mime_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Reading field {} failed: {}", name, e)))?;

        match name.as_str() {
            "title" => form.fields.title = value,
            "person" => selected_person = value,
            "new_person" => new_person = value,
            "size" => {
                form.fields.size = value
                    .parse::<Size>()
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?
            }
            "description" => form.fields.description = value,
            "audio_transcript" => form.fields.audio_transcript = value,
            "uploader" => form.fields.uploader.push(parse_label(&value)?),
            "toggle_uploader" => form.toggle_uploader = Some(parse_label(&value)?),
            "remove_image" => {
                form.remove_image = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ApiError::BadRequest(format!("Bad image index: {}", value)))?,
                )
            }
            other => tracing::debug!("Ignoring form field {}", other),
        }
    }

    form.fields.person = PersonChoice::from_form(&selected_person, &new_person);
    Ok(form)
}

fn parse_label(value: &str) -> ApiResult<UploaderLabel> {
    value
        .parse::<UploaderLabel>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}
