//! Template catalog route.

use axum::response::Json;

use crate::templates::{Template, catalog};

/// `GET /api/templates`: Every template in display order.
pub async fn list_templates() -> Json<&'static [Template]> {
    Json(catalog())
}
