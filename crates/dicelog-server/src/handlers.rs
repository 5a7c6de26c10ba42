// HTTP request handlers
//
// Implements the upload and retrieval endpoints plus a health check

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use dicelog_core::{
    check_content_length, check_file_size, check_uniform_id, ApiError, StorageKey, StoredRecord,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{AppError, AppState};

/// PUT /api/dice/log - multipart log upload
///
/// Validation order is part of the contract: declared Content-Length
/// first (before the body is consumed), then uniform_id, then the
/// actual file size.
pub(crate) async fn upload_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, AppError> {
    if let Some(declared) = content_length(&headers) {
        check_content_length(declared, state.max_upload_bytes)?;
    }

    let form = UploadForm::read(multipart)
        .await
        .map_err(|err| multipart_error(&state, &headers, err))?;

    check_uniform_id(&form.uniform_id)?;

    let file = form.file.ok_or_else(|| {
        state.internal(anyhow::anyhow!("multipart form is missing the file field"))
    })?;
    check_file_size(file.len(), state.max_upload_bytes)?;

    debug!("Received upload '{}' ({} bytes)", form.name, file.len());

    let encoded = BASE64.encode(&file);
    let key = StorageKey::generate();
    let composite = key.composite();
    let record = StoredRecord::new(encoded, form.name);

    let accepted = state
        .storage
        .put(&composite, &record)
        .await
        .map_err(|err| state.internal(err))?;
    if !accepted {
        warn!("Storage backend reported a failed write for key {}", key.key);
    }

    info!("Stored log under key {} ({} bytes)", key.key, file.len());

    let response = Json(json!({
        "url": format!("{}?key={}#{}", state.frontend.as_str(), key.key, key.password),
    }));

    Ok((StatusCode::OK, response).into_response())
}

/// GET /api/dice/load_data - record retrieval by key+password
pub(crate) async fn load_data(
    State(state): State<AppState>,
    Query(params): Query<RetrieveParams>,
) -> Result<Response, AppError> {
    let (key, password) = match (params.key, params.password) {
        (Some(key), Some(password)) if !key.is_empty() && !password.is_empty() => (key, password),
        _ => return Err(ApiError::MissingCredentials.into()),
    };

    let composite = StorageKey::composite_of(&key, &password);

    let record = state
        .storage
        .get(&composite)
        .await
        .map_err(|err| state.internal(err))?;

    match record {
        Some(record) => Ok((StatusCode::OK, Json(record)).into_response()),
        None => Err(ApiError::NotFound.into()),
    }
}

/// GET /health - Basic health check
pub(crate) async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

#[derive(Deserialize)]
pub(crate) struct RetrieveParams {
    key: Option<String>,
    password: Option<String>,
}

/// Collected multipart fields. The whole form is read before any field
/// validation so the checks run in their contractual order regardless
/// of field order on the wire.
struct UploadForm {
    name: String,
    uniform_id: String,
    file: Option<axum::body::Bytes>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self {
            name: String::new(),
            uniform_id: String::new(),
            file: None,
        };

        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().map(str::to_owned);
            match field_name.as_deref() {
                Some("name") => form.name = field.text().await?,
                Some("uniform_id") => form.uniform_id = field.text().await?,
                Some("file") => form.file = Some(field.bytes().await?),
                _ => {} // unknown fields are ignored
            }
        }

        Ok(form)
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
}

/// A multipart read failure is almost always the body limit backstop
/// tripping on an oversized chunked upload; surface that as the size
/// rejection. Everything else is an internal failure.
fn multipart_error(state: &AppState, headers: &HeaderMap, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let size = content_length(headers).unwrap_or(0) as usize;
        return ApiError::FileTooLarge {
            size,
            limit: state.max_upload_bytes,
        }
        .into();
    }

    state.internal(anyhow::Error::new(err).context("Failed to read multipart form"))
}
