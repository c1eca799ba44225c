//! Per-browser view state keyed by a session cookie
//!
//! The catalog is shared; page, filters, expanded item, draft, recorder and
//! status banner belong to one browser. [`session_layer`] issues the
//! `ermihadu_session` cookie on the first request without a valid one, and
//! the [`Session`] extractor hands handlers that browser's [`ViewState`].

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::{ApiError, AppState};
use ermihadu_common::view::{Action, ActionError, ViewState};

pub const SESSION_COOKIE: &str = "ermihadu_session";

/// Views untouched for this long are dropped when a new session starts
pub const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

struct SessionEntry {
    view: Arc<RwLock<ViewState>>,
    last_seen: Instant,
}

/// All live browser views
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, SessionEntry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The view for `id`, created empty on first use
    pub async fn view(&self, id: SessionId) -> Arc<RwLock<ViewState>> {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        if !sessions.contains_key(&id) {
            let before = sessions.len();
            sessions.retain(|_, entry| now.duration_since(entry.last_seen) < SESSION_IDLE_TIMEOUT);
            if sessions.len() < before {
                debug!(expired = before - sessions.len(), "Dropped idle sessions");
            }
        }

        let entry = sessions.entry(id).or_insert_with(|| SessionEntry {
            view: Arc::new(RwLock::new(ViewState::new())),
            last_seen: now,
        });
        entry.last_seen = now;
        entry.view.clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn session_cookie(id: SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.0.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Middleware attaching a [`SessionId`] to every request
///
/// A missing or unparseable cookie starts a new session and sets the cookie
/// on the response.
pub async fn session_layer(jar: CookieJar, mut request: Request, next: Next) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .map(SessionId);
    let id = existing.unwrap_or_else(|| SessionId(Uuid::new_v4()));
    request.extensions_mut().insert(id);

    let response = next.run(request).await;
    match existing {
        Some(_) => response,
        None => (jar.add(session_cookie(id)), response).into_response(),
    }
}

/// The requesting browser's view
pub struct Session {
    pub id: SessionId,
    pub view: Arc<RwLock<ViewState>>,
}

impl Session {
    /// Apply one action to this browser's view
    pub async fn dispatch(&self, action: Action) -> Result<(), ActionError> {
        self.view.write().await.apply(action)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = parts
            .extensions
            .get::<SessionId>()
            .copied()
            .ok_or_else(|| ApiError::Internal("Session layer missing on this route".to_string()))?;
        let view = state.sessions.view(id).await;
        Ok(Self { id, view })
    }
}
