//! Upload, publish and serve stored objects.

use std::net::SocketAddr;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{Extensions, HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::object_path;

/// Objects never change once written: ids are single-use.
const OBJECT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadUrlResponse {
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPathResponse {
    pub object_path: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ContactIconRequest {
    #[serde(rename = "iconURL")]
    pub icon_url: String,
}

/// `POST /api/objects/upload`: Issue a one-shot upload URL.
///
/// Rate limited per peer IP when the server records connect info.
pub async fn request_upload(
    State(state): State<AppState>,
    extensions: Extensions,
) -> Result<Json<UploadUrlResponse>, ApiError> {
    let client = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    state.upload_limiter.check_and_record(client)?;
    let grant = state.storage.request_upload();
    Ok(Json(UploadUrlResponse { upload_url: grant.upload_url }))
}

/// `PUT /api/objects/uploads/{id}?token=`: Store the raw body.
pub async fn put_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ObjectPathResponse>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let meta = state
        .storage
        .accept_upload(id, &query.token, content_type, body.to_vec())
        .await?;
    Ok(Json(ObjectPathResponse { object_path: object_path(meta.id) }))
}

/// `PUT /api/contact-icons`: Publish an uploaded icon.
pub async fn register_contact_icon(
    State(state): State<AppState>,
    Json(req): Json<ContactIconRequest>,
) -> Result<Json<ObjectPathResponse>, ApiError> {
    let object_path = state.storage.publish(&req.icon_url).await?;
    Ok(Json(ObjectPathResponse { object_path }))
}

/// `GET /objects/uploads/{id}`: Serve a public object.
pub async fn serve_object(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let object = state.storage.fetch_public(id).await?;
    let etag = format!("\"{}\"", object.meta.sha256);

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag || tag.trim() == "*"));

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        object.bytes.into_response()
    };

    let out = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&object.meta.content_type) {
        out.insert(header::CONTENT_TYPE, v);
    }
    if let Ok(v) = HeaderValue::from_str(&etag) {
        out.insert(header::ETAG, v);
    }
    out.insert(header::CACHE_CONTROL, HeaderValue::from_static(OBJECT_CACHE_CONTROL));
    out.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    Ok(response)
}

#[cfg(test)]
#[path = "objects_test.rs"]
mod tests;
