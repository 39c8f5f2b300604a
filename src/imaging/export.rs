//! PNG, GIF, and data-URL encodings for generated images.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, GenericImageView, ImageFormat, RgbaImage};

use crate::error::ErrorCode;
use crate::imaging::MAX_EDGE_PX;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error("image too large: {width}x{height} (max edge {max}px)", max = MAX_EDGE_PX)]
    TooLarge { width: u32, height: u32 },
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(&'static str),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ErrorCode for ExportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_IMAGE_DECODE",
            Self::Encode(_) => "E_IMAGE_ENCODE",
            Self::TooLarge { .. } => "E_IMAGE_TOO_LARGE",
            Self::InvalidDataUrl(_) => "E_INVALID_DATA_URL",
            Self::Base64(_) => "E_INVALID_BASE64",
        }
    }

    fn status(&self) -> axum::http::StatusCode {
        match self {
            Self::Encode(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::TooLarge { .. } => axum::http::StatusCode::PAYLOAD_TOO_LARGE,
            _ => axum::http::StatusCode::BAD_REQUEST,
        }
    }
}

/// A decoded `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Name of the N-th exported animation frame (1-based).
#[must_use]
pub fn frame_file_name(n: usize) -> String {
    format!("signature-frame-{n}.png")
}

/// # Errors
///
/// Returns `Encode` if the PNG encoder fails.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| ExportError::Encode(e.to_string()))?;
    Ok(buf.into_inner())
}

/// Encode as `data:image/png;base64,...`.
///
/// # Errors
///
/// Returns `Encode` if the PNG encoder fails.
pub fn png_data_url(img: &RgbaImage) -> Result<String, ExportError> {
    Ok(data_url("image/png", &encode_png(img)?))
}

#[must_use]
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", B64.encode(bytes))
}

/// Parse a base64 `data:` URL.
///
/// # Errors
///
/// Returns `InvalidDataUrl` for non-data or non-base64 URLs and `Base64`
/// for a malformed payload.
pub fn decode_data_url(raw: &str) -> Result<DataUrl, ExportError> {
    let rest = raw
        .trim()
        .strip_prefix("data:")
        .ok_or(ExportError::InvalidDataUrl("missing data: prefix"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or(ExportError::InvalidDataUrl("missing comma"))?;
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(ExportError::InvalidDataUrl("only base64 payloads are supported"));
    };
    let mime = mime.split(';').next().unwrap_or_default();
    let mime = if mime.is_empty() { "text/plain" } else { mime };

    let bytes = B64.decode(payload.trim())?;
    Ok(DataUrl { mime: mime.to_ascii_lowercase(), bytes })
}

/// Decode PNG/JPEG/WebP/GIF bytes, rejecting oversized images.
///
/// # Errors
///
/// Returns `Decode` for unreadable data and `TooLarge` past [`MAX_EDGE_PX`].
pub fn load_image(bytes: &[u8]) -> Result<DynamicImage, ExportError> {
    let img = image::load_from_memory(bytes).map_err(|e| ExportError::Decode(e.to_string()))?;
    let (width, height) = img.dimensions();
    if width > MAX_EDGE_PX || height > MAX_EDGE_PX {
        return Err(ExportError::TooLarge { width, height });
    }
    Ok(img)
}

/// Decode an image carried in a `data:image/...` URL.
///
/// # Errors
///
/// See [`decode_data_url`] and [`load_image`].
pub fn load_data_url_image(raw: &str) -> Result<DynamicImage, ExportError> {
    let url = decode_data_url(raw)?;
    if !url.mime.starts_with("image/") {
        return Err(ExportError::InvalidDataUrl("not an image"));
    }
    load_image(&url.bytes)
}

/// Assemble frames into an endlessly looping GIF.
///
/// # Errors
///
/// Returns `Encode` if the GIF encoder fails.
pub fn encode_gif<'a>(frames: impl IntoIterator<Item = &'a RgbaImage>, delay_ms: u32) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buf, 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        let delay = Delay::from_numer_denom_ms(delay_ms, 1);
        encoder
            .encode_frames(frames.into_iter().map(|img| Frame::from_parts(img.clone(), 0, 0, delay)))
            .map_err(|e| ExportError::Encode(e.to_string()))?;
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "export_test.rs"]
mod tests;
