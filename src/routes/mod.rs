//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the JSON API under `/api`, published objects
//! under `/objects`, and a health probe. Every route shares the same CORS,
//! compression, tracing and body-limit layers.

pub mod images;
pub mod objects;
pub mod signatures;
pub mod templates;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Headroom for the JSON envelope around a base64 payload.
const ENVELOPE_SLACK_BYTES: usize = 64 * 1024;

/// Largest request body accepted on any route.
///
/// Data-URL endpoints carry base64, which is 4/3 the size of the raw bytes.
#[must_use]
pub fn body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes
        .saturating_mul(4)
        .div_ceil(3)
        .saturating_add(ENVELOPE_SLACK_BYTES)
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let limit = body_limit(state.config.max_upload_bytes);

    Router::new()
        .route("/api/objects/upload", post(objects::request_upload))
        .route("/api/objects/uploads/{id}", put(objects::put_upload))
        .route("/api/contact-icons", put(objects::register_contact_icon))
        .route("/objects/uploads/{id}", get(objects::serve_object))
        .route("/api/templates", get(templates::list_templates))
        .route("/api/signatures/render", post(signatures::render))
        .route("/api/images/crop", post(images::crop_image))
        .route("/api/animations", post(images::animate))
        .route("/healthz", get(healthz))
        .layer(DefaultBodyLimit::max(limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
