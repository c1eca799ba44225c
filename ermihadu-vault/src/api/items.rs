//! JSON views of the item list and the people list

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::{ApiError, ApiResult, AppState};
use ermihadu_common::filter::{apply_filters, FilterSelection, PersonFilter, Recency, SizeFilter};
use ermihadu_common::{Item, People};

/// `size`, `recency` and `person` query parameters
///
/// Absent parameters keep the value of the selection they are merged into.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub size: Option<String>,
    pub recency: Option<String>,
    pub person: Option<String>,
}

impl FilterQuery {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.recency.is_none() && self.person.is_none()
    }

    /// Overlay the query onto `base`
    pub fn merge_into(&self, base: &FilterSelection) -> ApiResult<FilterSelection> {
        let mut selection = base.clone();
        if let Some(size) = &self.size {
            selection.size = size
                .parse::<SizeFilter>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        }
        if let Some(recency) = &self.recency {
            selection.recency = recency
                .parse::<Recency>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        }
        if let Some(person) = &self.person {
            selection.person = PersonFilter::from(person.clone());
        }
        Ok(selection)
    }
}

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", get(list_items))
        .route("/api/people", get(list_people))
}

/// GET /api/items
///
/// Filtered and sorted by the query (defaults: all sizes, newest first,
/// all people). Does not change the page's own filter selection.
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> ApiResult<Json<Vec<Item>>> {
    let selection = query.merge_into(&FilterSelection::default())?;
    let catalog = state.catalog.read().await;
    let items = apply_filters(&catalog.items, &selection)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(items))
}

/// GET /api/people
pub async fn list_people(State(state): State<AppState>) -> Json<People> {
    Json(state.catalog.read().await.people.clone())
}
