// End-to-end tests for the HTTP surface
//
// The router is driven in-process with tower's oneshot; records land in
// a temporary filesystem storage directory.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dicelog_config::FrontendUrl;
use dicelog_core::StoredRecord;
use dicelog_server::{router, AppState};
use dicelog_storage::{FsStorage, Storage};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const FRONTEND: &str = "https://logs.example.com";
const BOUNDARY: &str = "dicelog-test-boundary";

async fn fs_state(dir: &Path, max_upload_bytes: usize) -> AppState {
    AppState {
        storage: Arc::new(FsStorage::new(dir).await.expect("storage dir")),
        frontend: FrontendUrl::resolve(FRONTEND).expect("frontend url"),
        max_upload_bytes,
        debug_errors: false,
    }
}

fn multipart_body(name: &str, uniform_id: &str, file: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, value) in [("name", name.as_bytes()), ("uniform_id", uniform_id.as_bytes())] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"log.txt\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(name: &str, uniform_id: &str, file: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri("/api/dice/log")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(name, uniform_id, file)))
        .expect("request")
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Pull (key, password) out of a `{frontend}?key={key}#{password}` URL
fn credentials_from_url(url: &str) -> (String, String) {
    let composite = url
        .strip_prefix(&format!("{FRONTEND}/?key="))
        .expect("url should start with the frontend base");
    let (key, password) = composite.split_once('#').expect("composite separator");
    (key.to_string(), password.to_string())
}

#[tokio::test]
async fn test_upload_then_retrieve_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    let file = b"2024-05-01 roll: 1d20 => 17\n\x00\xfe binary tail";
    let response = app
        .clone()
        .oneshot(upload_request("session one", "platform:123456", file))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    let url = body["url"].as_str().expect("url field");
    let (key, password) = credentials_from_url(url);
    assert_eq!(key.len(), 4);
    assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(password.len(), 6);
    assert!(password.chars().all(|c| c.is_ascii_digit()));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/dice/load_data?key={key}&password={password}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let record: StoredRecord = serde_json::from_value(response_json(response).await)?;
    assert_eq!(record.client, "SealDice");
    assert_eq!(record.name, "session one");
    assert!(record.note.is_empty());
    assert_eq!(BASE64.decode(record.data.as_bytes())?, file);

    Ok(())
}

#[tokio::test]
async fn test_wrong_password_is_not_found() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    let response = app
        .clone()
        .oneshot(upload_request("s", "platform:1", b"log"))
        .await?;
    let body = response_json(response).await;
    let (key, password) = credentials_from_url(body["url"].as_str().expect("url"));

    let wrong = if password == "100000" { "100001" } else { "100000" };
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/dice/load_data?key={key}&password={wrong}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await,
        json!({"error": "Data not found"})
    );

    Ok(())
}

#[tokio::test]
async fn test_unknown_key_is_not_found() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/dice/load_data?key=zzzz&password=123456")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_invalid_uniform_id_is_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    let response = app
        .oneshot(upload_request("s", "abc", b"log"))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await,
        json!({"data": "uniform_id field did not pass validation"})
    );

    // nothing may reach storage on a rejected upload
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_declared_content_length_is_checked_first() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let limit = 2 * 1024 * 1024;
    let app = router(fs_state(dir.path(), limit).await)?;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/api/dice/log")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .header(header::CONTENT_LENGTH, (limit as u64 + 1).to_string())
                .body(Body::from(multipart_body("s", "platform:1", b"tiny")))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response_json(response).await,
        json!({"success": false, "message": "File size exceeds 2MB limit"})
    );

    Ok(())
}

#[tokio::test]
async fn test_oversized_file_is_rejected_after_read() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // small ceiling keeps the test body small; no Content-Length header
    // is set, so only the post-read check can fire
    let limit = 1024;
    let app = router(fs_state(dir.path(), limit).await)?;

    let response = app
        .oneshot(upload_request("s", "platform:1", &vec![b'x'; limit + 1]))
        .await?;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response_json(response).await,
        json!({"data": "Size is too big!"})
    );

    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_are_rejected() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    for uri in [
        "/api/dice/load_data",
        "/api/dice/load_data?key=Ab3z",
        "/api/dice/load_data?password=123456",
        "/api/dice/load_data?key=&password=123456",
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri(uri)
                    .body(Body::empty())?,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri: {uri}");
        assert_eq!(
            response_json(response).await,
            json!({"error": "Missing key or password"}),
            "uri: {uri}"
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_preflight_never_touches_storage() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/dice/log")
                .header(header::ORIGIN, FRONTEND)
                .header("access-control-request-method", "PUT")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some(FRONTEND)
    );
    let methods = headers
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(methods.contains("PUT"), "allow-methods: {methods}");
    let allow_headers = headers
        .get("access-control-allow-headers")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(allow_headers.contains("content-type"));
    assert!(allow_headers.contains("accept-version"));

    // the preflight must not create or read any record
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/dice/load_data")
                .header(header::ORIGIN, FRONTEND)
                .header("access-control-request-method", "GET")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let methods = response
        .headers()
        .get("access-control-allow-methods")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(methods.contains("GET"), "allow-methods: {methods}");

    Ok(())
}

#[tokio::test]
async fn test_api_responses_carry_the_cors_origin() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    let mut request = upload_request("s", "platform:1", b"log");
    request
        .headers_mut()
        .insert(header::ORIGIN, FRONTEND.parse()?);
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some(FRONTEND)
    );

    Ok(())
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = router(fs_state(dir.path(), 2 * 1024 * 1024).await)?;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/health")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await, json!({"status": "healthy"}));

    Ok(())
}

/// A backend whose failures propagate, standing in for the hosted store
struct FailingStorage;

#[async_trait::async_trait]
impl Storage for FailingStorage {
    async fn put(&self, _key: &str, _record: &StoredRecord) -> Result<bool> {
        anyhow::bail!("kv endpoint unreachable")
    }

    async fn get(&self, _key: &str) -> Result<Option<StoredRecord>> {
        anyhow::bail!("kv endpoint unreachable")
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        anyhow::bail!("kv endpoint unreachable")
    }
}

#[tokio::test]
async fn test_backend_failure_is_an_internal_error() -> Result<()> {
    let state = AppState {
        storage: Arc::new(FailingStorage),
        frontend: FrontendUrl::resolve(FRONTEND)?,
        max_upload_bytes: 2 * 1024 * 1024,
        debug_errors: false,
    };
    let app = router(state)?;

    let response = app
        .oneshot(upload_request("s", "platform:1", b"log"))
        .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response_json(response).await,
        json!({"error": "Internal Server Error"})
    );

    Ok(())
}

#[tokio::test]
async fn test_debug_errors_exposes_the_chain() -> Result<()> {
    let state = AppState {
        storage: Arc::new(FailingStorage),
        frontend: FrontendUrl::resolve(FRONTEND)?,
        max_upload_bytes: 2 * 1024 * 1024,
        debug_errors: true,
    };
    let app = router(state)?;

    let response = app
        .oneshot(upload_request("s", "platform:1", b"log"))
        .await?;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap_or_default()
            .contains("kv endpoint unreachable"),
        "body: {body}"
    );

    Ok(())
}
