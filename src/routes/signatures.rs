//! Signature rendering route.

use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::SignatureDesign;
use crate::templates::{render_html, render_text};

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderedSignature {
    pub html: String,
    pub text: String,
}

/// `POST /api/signatures/render`: HTML and plain-text forms of a design.
pub async fn render(Json(design): Json<SignatureDesign>) -> Result<Json<RenderedSignature>, ApiError> {
    design.validate()?;
    tracing::debug!(template = design.template.as_str(), "rendering signature");
    Ok(Json(RenderedSignature { html: render_html(&design), text: render_text(&design) }))
}

#[cfg(test)]
#[path = "signatures_test.rs"]
mod tests;
