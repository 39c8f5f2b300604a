//! Image crop and animation routes.
//!
//! Decoding, drawing and encoding are CPU-bound, so each request runs its
//! pipeline on the blocking pool.

use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::imaging::animation::{AnimationSpec, generate_frames};
use crate::imaging::crop::{CropSettings, crop};
use crate::imaging::export::{data_url, encode_gif, load_data_url_image, png_data_url};

fn default_output_width() -> u32 {
    400
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropRequest {
    /// `data:image/...;base64,` source.
    pub image: String,
    #[serde(default)]
    pub settings: CropSettings,
    #[serde(default = "default_output_width")]
    pub output_width: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CropResponse {
    #[serde(rename = "dataURL")]
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
pub struct AnimationRequest {
    pub image: String,
    #[serde(default)]
    pub spec: AnimationSpec,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameResponse {
    pub index: usize,
    pub file_name: String,
    #[serde(rename = "dataURL")]
    pub data_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnimationResponse {
    pub frames: Vec<FrameResponse>,
    /// Looping GIF of every frame, as a data URL.
    pub gif: String,
}

/// `POST /api/images/crop`
pub async fn crop_image(Json(req): Json<CropRequest>) -> Result<Json<CropResponse>, ApiError> {
    let response = run_blocking(move || {
        let source = load_data_url_image(&req.image)?;
        let cropped = crop(&source, &req.settings, req.output_width)?;
        Ok(CropResponse { data_url: png_data_url(&cropped)?, width: cropped.width(), height: cropped.height() })
    })
    .await?;
    Ok(Json(response))
}

/// `POST /api/animations`
pub async fn animate(Json(req): Json<AnimationRequest>) -> Result<Json<AnimationResponse>, ApiError> {
    let response = run_blocking(move || {
        let decoded = load_data_url_image(&req.image)?;
        req.spec.validate()?;
        req.spec.check_budget(decoded.width(), decoded.height())?;
        let source = decoded.to_rgba8();
        let rendered = generate_frames(&source, &req.spec)?;
        let gif = encode_gif(rendered.iter().map(|f| &f.image), req.spec.frame_delay_ms)?;

        let frames = rendered
            .iter()
            .map(|f| -> Result<FrameResponse, ApiError> {
                Ok(FrameResponse {
                    index: f.index,
                    file_name: f.file_name.clone(),
                    data_url: png_data_url(&f.image)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(frames = frames.len(), effect = ?req.spec.effect, "animation rendered");
        Ok(AnimationResponse { frames, gif: data_url("image/gif", &gif) })
    })
    .await?;
    Ok(Json(response))
}

async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| ApiError::internal(format!("image task failed: {e}")))?
}

#[cfg(test)]
#[path = "images_test.rs"]
mod tests;
