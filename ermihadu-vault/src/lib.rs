//! ermihadu-vault library interface
//!
//! Exposes the router and application state for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod google;
pub mod render;
pub mod services;
pub mod session;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;

use ermihadu_common::events::EventBus;
use ermihadu_common::view::Catalog;
use ermihadu_common::People;
use session::SessionStore;
use storage::Backends;

/// Largest accepted request body (photos from phones are several MB each)
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Items and people, the same for every browser
    pub catalog: Arc<RwLock<Catalog>>,
    /// Per-browser view state
    pub sessions: SessionStore,
    /// Held for the whole upload pipeline; one submission at a time
    pub submission_guard: Arc<Mutex<()>>,
    /// Item source, asset store and row sink
    pub backends: Backends,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(backends: Backends, people: People, event_bus: EventBus) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(Catalog::new(people))),
            sessions: SessionStore::new(),
            submission_guard: Arc::new(Mutex::new(())),
            backends,
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }

    pub async fn clear_error(&self) {
        *self.last_error.write().await = None;
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    // Pages and the recorder act on the requesting browser's view
    let session_routes = Router::new()
        .merge(api::page_routes())
        .merge(api::audio_routes())
        .layer(middleware::from_fn(session::session_layer));

    Router::new()
        .merge(session_routes)
        .merge(api::item_routes())
        .route("/events", get(api::event_stream))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .merge(api::static_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
