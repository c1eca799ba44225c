//! HTTP surface tests (router driven with `oneshot`)

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tower::ServiceExt;
use uuid::Uuid;

use common::{harness, harness_with, row, FakeSheet, Harness};
use ermihadu_common::view::{Action, Page, ViewState};
use ermihadu_common::Size;
use ermihadu_vault::build_router;
use ermihadu_vault::services::refresh_items;
use ermihadu_vault::session::{SessionId, SESSION_COOKIE};

const BOUNDARY: &str = "vault-test-boundary";

async fn loaded() -> Harness {
    let h = harness_with(FakeSheet::with_rows(vec![
        row("Teapot", "Grammie", Size::Small, "2024-01-01"),
        row("Lamp", "Verna", Size::Large, "2024-06-01"),
    ]));
    refresh_items(&h.state).await.unwrap();
    h
}

async fn send(h: &Harness, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = build_router(h.state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8_lossy(&body).to_string())
}

async fn get(h: &Harness, uri: &str) -> (StatusCode, HeaderMap, String) {
    send(h, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

/// One browser: keeps the session cookie the server hands out
#[derive(Default)]
struct Browser {
    session: Option<Uuid>,
}

impl Browser {
    async fn send(&mut self, h: &Harness, mut request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        if let Some(id) = self.session {
            request.headers_mut().insert(
                header::COOKIE,
                format!("{}={}", SESSION_COOKIE, id).parse().unwrap(),
            );
        }
        let (status, headers, body) = send(h, request).await;
        for cookie in headers.get_all(header::SET_COOKIE) {
            let cookie = cookie.to_str().unwrap();
            if let Some(value) = cookie
                .split(';')
                .next()
                .and_then(|pair| pair.strip_prefix(&format!("{}=", SESSION_COOKIE)))
            {
                self.session = Some(Uuid::parse_str(value).unwrap());
            }
        }
        (status, headers, body)
    }

    async fn get(&mut self, h: &Harness, uri: &str) -> (StatusCode, HeaderMap, String) {
        self.send(h, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post(&mut self, h: &Harness, uri: &str, body: Body) -> (StatusCode, HeaderMap, String) {
        self.send(h, Request::builder().method("POST").uri(uri).body(body).unwrap()).await
    }

    /// This browser's server-side view
    async fn view(&self, h: &Harness) -> Arc<RwLock<ViewState>> {
        let id = self.session.expect("no session cookie received yet");
        h.state.sessions.view(SessionId(id)).await
    }
}

/// Multipart body: text fields, then image files
fn multipart(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    for (file_name, mime, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, file_name, mime
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/submit")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn to(uri: &str, mut request: Request<Body>) -> Request<Body> {
    *request.uri_mut() = uri.parse().unwrap();
    request
}

#[tokio::test]
async fn test_health_endpoint() {
    let h = harness();
    let (status, _, body) = get(&h, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "ermihadu-vault");
    assert!(json["uptime_seconds"].is_u64());
    assert!(json.get("last_error").is_none());
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let h = harness();
    let (status, _, body) = get(&h, "/api/buildinfo").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["git_hash"].is_string());
}

#[tokio::test]
async fn test_root_serves_list_html() {
    let h = loaded().await;
    let (status, headers, body) = get(&h, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(body.find("Lamp").unwrap() < body.find("Teapot").unwrap());
}

#[tokio::test]
async fn test_first_visit_sets_session_cookie() {
    let h = harness();
    let (_, headers, _) = get(&h, "/").await;
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("HttpOnly"));

    let mut browser = Browser::default();
    browser.get(&h, "/").await;
    let (_, headers, _) = browser.get(&h, "/").await;
    assert!(headers.get(header::SET_COOKIE).is_none(), "known session keeps its cookie");
}

#[tokio::test]
async fn test_root_query_updates_filters() {
    let h = loaded().await;
    let mut browser = Browser::default();
    let (status, _, body) = browser.get(&h, "/?size=Small").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Teapot"));
    assert!(!body.contains("Lamp"));

    // Selection sticks for the next plain render
    let (_, _, body) = browser.get(&h, "/").await;
    assert!(!body.contains("Lamp"));

    let (_, _, body) = browser.get(&h, "/?size=all&recency=oldest").await;
    assert!(body.find("Teapot").unwrap() < body.find("Lamp").unwrap());
}

#[tokio::test]
async fn test_person_named_all_can_be_filtered() {
    let h = harness_with(FakeSheet::with_rows(vec![
        row("Teapot", "Grammie", Size::Small, "2024-01-01"),
        row("Hat", "all", Size::Small, "2024-03-01"),
    ]));
    refresh_items(&h.state).await.unwrap();
    let mut browser = Browser::default();

    let (_, _, body) = browser.get(&h, "/?person=all").await;
    assert!(body.contains("Hat"));
    assert!(!body.contains("Teapot"));

    let (_, _, body) = browser.get(&h, "/?person=").await;
    assert!(body.contains("Hat"));
    assert!(body.contains("Teapot"));
}

#[tokio::test]
async fn test_root_rejects_unknown_size() {
    let h = loaded().await;
    let (status, _, body) = get(&h, "/?size=Gigantic").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_reloading_expanded_item_keeps_it_open() {
    let h = loaded().await;
    let mut browser = Browser::default();

    for _ in 0..2 {
        let (status, _, body) = browser.get(&h, "/?expand=1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Uploaded by: ER"));
        assert!(body.contains(r#"href="/?collapse=1#item-1">Hide<"#));
    }

    let (_, _, body) = browser.get(&h, "/?collapse=1").await;
    assert!(!body.contains("Uploaded by:"));
    let (_, _, body) = browser.get(&h, "/?collapse=1").await;
    assert!(!body.contains("Uploaded by:"));
    assert!(body.contains(r#"href="/?expand=1#item-1">Read<"#));
}

#[tokio::test]
async fn test_collapse_of_other_item_keeps_expanded() {
    let h = loaded().await;
    let mut browser = Browser::default();
    browser.get(&h, "/?expand=1").await;
    let (_, _, body) = browser.get(&h, "/?collapse=0").await;
    assert!(body.contains("Uploaded by: ER"));
}

#[tokio::test]
async fn test_browsers_keep_separate_views() {
    let h = loaded().await;
    let mut first = Browser::default();
    let mut second = Browser::default();

    // First browser narrows the list and starts a draft
    first.get(&h, "/?size=Small").await;
    first.get(&h, "/upload").await;
    let request = to(
        "/draft",
        multipart(&[("title", "Grandpa's watch"), ("person", "person:Verna")], &[]),
    );
    let (status, _, _) = first.send(&h, request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    // Second browser sees the full list and no form
    let (_, _, body) = second.get(&h, "/").await;
    assert!(body.contains("Lamp"));
    assert!(body.contains("Teapot"));
    assert!(!body.contains("Grandpa&#39;s watch"));
    assert!(!body.contains("Add Item"));

    // Its cancel leaves the first browser's draft alone
    let (status, _, _) = second.post(&h, "/cancel", Body::empty()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (_, _, body) = first.get(&h, "/").await;
    assert!(body.contains("Add Item"));
    assert!(body.contains(r#"value="Grandpa&#39;s watch""#));
    assert!(body.contains(r#"<option value="person:Verna" selected>Verna</option>"#));

    let (_, _, body) = second.get(&h, "/").await;
    assert!(body.contains("Lamp"));
    assert_ne!(first.session, second.session);
    assert_eq!(h.state.sessions.len().await, 2);
}

#[tokio::test]
async fn test_empty_list_shows_empty_state() {
    let h = harness();
    let (_, _, body) = get(&h, "/").await;
    assert!(body.contains("No items yet. Click the + button to add your first memory!"));
}

#[tokio::test]
async fn test_api_items_filters_without_touching_page_state() {
    let h = loaded().await;
    let (status, _, body) = get(&h, "/api/items?person=Verna").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    let titles: Vec<&str> = json.as_array().unwrap().iter().map(|i| i["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Lamp"]);

    let (_, _, body) = get(&h, "/api/items").await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["title"], "Lamp");
    assert_eq!(json[0]["size"], "Large");
}

#[tokio::test]
async fn test_api_people_lists_seed() {
    let h = harness();
    let (_, _, body) = get(&h, "/api/people").await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json, serde_json::json!(["Grammie", "Verna", "Elaine", "Joyce"]));
}

#[tokio::test]
async fn test_upload_and_cancel_switch_pages() {
    let h = harness();
    let mut browser = Browser::default();
    let (status, headers, _) = browser.get(&h, "/upload").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/");
    assert_eq!(browser.view(&h).await.read().await.page, Page::Form);

    let (_, _, body) = browser.get(&h, "/").await;
    assert!(body.contains("Add Item"));

    let (status, _, _) = browser.post(&h, "/cancel", Body::empty()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(browser.view(&h).await.read().await.page, Page::List);
}

#[tokio::test]
async fn test_submit_form_appends_row() {
    let h = harness();
    let mut browser = Browser::default();
    browser.get(&h, "/upload").await;

    let request = multipart(
        &[
            ("title", "Teapot"),
            ("person", "new"),
            ("new_person", "Aunt Rose"),
            ("size", "Small"),
            ("description", "Blue willow"),
            ("uploader", "HA"),
            ("uploader", "ER"),
        ],
        &[("teapot.png", "image/png", b"\x89PNG")],
    );
    let (status, headers, _) = browser.send(&h, request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers.get(header::LOCATION).unwrap(), "/");

    let rows = h.sheet.rows.lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].person, "Aunt Rose");
    assert_eq!(rows[0].size, Size::Small);
    assert_eq!(rows[0].uploader, "HAER");
    assert_eq!(rows[0].image_urls.len(), 1);

    let (_, _, body) = get(&h, "/api/people").await;
    assert!(body.contains("Aunt Rose"));
}

#[tokio::test]
async fn test_submit_missing_fields_shows_banner() {
    let h = harness();
    let mut browser = Browser::default();
    browser.get(&h, "/upload").await;

    let request = multipart(&[("title", "Teapot"), ("person", "person:Verna")], &[]);
    let (status, _, _) = browser.send(&h, request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(h.assets.upload_count(), 0);
    assert_eq!(h.sheet.row_count(), 0);

    let (_, _, body) = browser.get(&h, "/").await;
    assert!(body.contains("Please fill in title, person, and select uploader"));
    assert!(body.contains(r#"value="Teapot""#), "typed fields survive");
}

#[tokio::test]
async fn test_submit_while_uploading_is_conflict() {
    let h = harness();
    let mut browser = Browser::default();
    browser.get(&h, "/upload").await;
    browser
        .view(&h)
        .await
        .write()
        .await
        .apply(Action::SubmissionStarted)
        .unwrap();

    let request = multipart(&[("title", "Teapot"), ("person", "person:Verna"), ("uploader", "ER")], &[]);
    let (status, _, body) = browser.send(&h, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_submit_during_other_browsers_upload_is_conflict() {
    let h = harness();
    let mut browser = Browser::default();
    browser.get(&h, "/upload").await;
    let _in_flight = h.state.submission_guard.clone().try_lock_owned().unwrap();

    let request = multipart(&[("title", "Teapot"), ("person", "person:Verna"), ("uploader", "ER")], &[]);
    let (status, _, _) = browser.send(&h, request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(h.sheet.row_count(), 0);
}

#[tokio::test]
async fn test_draft_toggle_and_remove_image() {
    let h = harness();
    let mut browser = Browser::default();
    browser.get(&h, "/upload").await;

    let request = to(
        "/draft",
        multipart(
            &[("title", "Quilt"), ("uploader", "ER"), ("toggle_uploader", "MI")],
            &[("a.jpg", "image/jpeg", b"a"), ("b.jpg", "image/jpeg", b"b")],
        ),
    );
    let (status, _, _) = browser.send(&h, request).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    {
        let view = browser.view(&h).await;
        let view = view.read().await;
        assert_eq!(view.draft.uploader_string(), "ERMI");
        assert_eq!(view.draft.images.len(), 2);
    }

    let (status, headers, body) = browser.get(&h, "/draft/images/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/jpeg");
    assert_eq!(body, "b");

    let request = to(
        "/draft",
        multipart(
            &[("title", "Quilt"), ("uploader", "ER"), ("uploader", "MI"), ("remove_image", "0")],
            &[],
        ),
    );
    browser.send(&h, request).await;
    let view = browser.view(&h).await;
    let view = view.read().await;
    assert_eq!(view.draft.images.len(), 1);
    assert_eq!(view.draft.images[0].file_name, "b.jpg");
}

#[tokio::test]
async fn test_recording_endpoints() {
    let h = harness();
    let mut browser = Browser::default();

    let (status, _, body) = browser.post(&h, "/api/audio/start", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["recording"], true);

    let (status, _, _) = browser.post(&h, "/api/audio/start", Body::empty()).await;
    assert_eq!(status, StatusCode::CONFLICT, "only one recording at a time");

    let (status, _, _) = browser.post(&h, "/api/audio/chunk", Body::from(vec![1u8, 2])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    browser.post(&h, "/api/audio/chunk", Body::from(vec![3u8])).await;

    let (status, _, body) = browser.post(&h, "/api/audio/stop", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["recording"], false);
    assert_eq!(json["clip_bytes"], 3);

    let (status, headers, _) = browser.get(&h, "/api/audio/clip").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "audio/webm");

    // Stopping while idle is a no-op
    let (status, _, _) = browser.post(&h, "/api/audio/stop", Body::empty()).await;
    assert_eq!(status, StatusCode::OK);

    browser.post(&h, "/api/audio/discard", Body::empty()).await;
    let (status, _, _) = browser.get(&h, "/api/audio/clip").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chunk_without_recording_is_conflict() {
    let h = harness();
    let (status, _, _) = Browser::default()
        .post(&h, "/api/audio/chunk", Body::from(vec![1u8]))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_microphone_denied_shows_message() {
    let h = harness();
    let mut browser = Browser::default();
    browser.post(&h, "/api/audio/start", Body::empty()).await;
    let (status, _, _) = browser.post(&h, "/api/audio/denied", Body::empty()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!browser.view(&h).await.read().await.recorder.is_recording());

    let (_, _, body) = browser.get(&h, "/").await;
    assert!(body.contains("Could not access microphone"));

    let (status, _, _) = browser.post(&h, "/dismiss", Body::empty()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert!(browser.view(&h).await.read().await.status.is_none());
}

#[tokio::test]
async fn test_refresh_picks_up_new_rows() {
    let h = loaded().await;
    h.sheet
        .rows
        .lock()
        .unwrap()
        .push(row("Quilt", "Elaine", Size::Huge, "2024-09-01"));

    let (status, _, _) = Browser::default().post(&h, "/refresh", Body::empty()).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(h.state.catalog.read().await.items.len(), 3);
}

#[tokio::test]
async fn test_failed_refresh_banner_only_for_requesting_browser() {
    let h = loaded().await;
    let mut first = Browser::default();
    let mut second = Browser::default();
    first.get(&h, "/").await;
    second.get(&h, "/").await;

    *h.sheet.fail_fetch.lock().unwrap() = true;
    first.post(&h, "/refresh", Body::empty()).await;

    let (_, _, body) = first.get(&h, "/").await;
    assert!(body.contains("Could not load items"));
    let (_, _, body) = second.get(&h, "/").await;
    assert!(!body.contains("Could not load items"));
    assert!(body.contains("No items yet"), "the shared list is emptied");
}

#[tokio::test]
async fn test_static_assets() {
    let h = harness();
    let (status, headers, body) = get(&h, "/static/vault.js").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/javascript");
    // Chunks are posted in order and drained before stop
    assert!(body.contains("pending = pending"));
    assert!(body.find("await pending").unwrap() < body.find("'/api/audio/stop'").unwrap());
    let (status, _, _) = get(&h, "/static/vault.css").await;
    assert_eq!(status, StatusCode::OK);
}
