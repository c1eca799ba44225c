//! Embedded stylesheet and page script

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const VAULT_CSS: &str = include_str!("../../static/vault.css");
const VAULT_JS: &str = include_str!("../../static/vault.js");

pub fn static_routes() -> Router<AppState> {
    Router::new()
        .route("/static/vault.css", get(serve_vault_css))
        .route("/static/vault.js", get(serve_vault_js))
}

/// GET /static/vault.css
pub async fn serve_vault_css() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "text/css"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        VAULT_CSS,
    )
        .into_response()
}

/// GET /static/vault.js
pub async fn serve_vault_js() -> Response {
    (
        StatusCode::OK,
        [
            ("content-type", "application/javascript"),
            ("cache-control", "no-cache, no-store, must-revalidate"),
        ],
        VAULT_JS,
    )
        .into_response()
}
