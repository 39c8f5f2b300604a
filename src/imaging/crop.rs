//! Image cropper.
//!
//! DESIGN
//! ======
//! The output canvas *is* the crop rectangle. The source is first scaled to
//! cover that rectangle, then the user's adjustments are applied around the
//! canvas center in the order translate → rotate → scale, and the result
//! is drawn clipped to the canvas bounds. Circle crops add an elliptical
//! mask inscribed in the rectangle.

use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{BlendMode, FilterQuality, Mask, PathBuilder, Pixmap, PixmapPaint, Rect, Transform};

use crate::error::ErrorCode;
use crate::imaging::{MAX_EDGE_PX, from_pixmap, to_pixmap};

pub const DEFAULT_SCALE_PERCENT: f32 = 100.0;
pub const MIN_SCALE_PERCENT: f32 = 10.0;
pub const MAX_SCALE_PERCENT: f32 = 400.0;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CropError {
    #[error("source image is empty")]
    EmptySource,
    #[error("output width must be at least 1px")]
    ZeroWidth,
    #[error("invalid aspect ratio {width}:{height}")]
    InvalidAspect { width: f32, height: f32 },
    #[error("crop output {width}x{height} exceeds {max}px per side", max = MAX_EDGE_PX)]
    TooLarge { width: u32, height: u32 },
    #[error("canvas allocation failed")]
    Canvas,
}

impl ErrorCode for CropError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptySource => "E_EMPTY_SOURCE",
            Self::ZeroWidth => "E_ZERO_WIDTH",
            Self::InvalidAspect { .. } => "E_INVALID_ASPECT",
            Self::TooLarge { .. } => "E_CROP_TOO_LARGE",
            Self::Canvas => "E_CANVAS",
        }
    }

    fn status(&self) -> axum::http::StatusCode {
        match self {
            Self::Canvas => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            _ => axum::http::StatusCode::BAD_REQUEST,
        }
    }
}

// =============================================================================
// SETTINGS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AspectRatio {
    #[default]
    Square,
    /// 16:9
    Landscape,
    /// 3:4
    Portrait,
    Custom {
        width: f32,
        height: f32,
    },
}

impl AspectRatio {
    /// Width divided by height.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAspect` for non-positive or non-finite custom sides.
    pub fn ratio(self) -> Result<f32, CropError> {
        match self {
            Self::Square => Ok(1.0),
            Self::Landscape => Ok(16.0 / 9.0),
            Self::Portrait => Ok(3.0 / 4.0),
            Self::Custom { width, height } => {
                if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
                    Ok(width / height)
                } else {
                    Err(CropError::InvalidAspect { width, height })
                }
            }
        }
    }

    /// Parse `square`, `landscape`, `portrait`, or `W:H`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "square" | "1:1" => Some(Self::Square),
            "landscape" | "16:9" => Some(Self::Landscape),
            "portrait" | "3:4" => Some(Self::Portrait),
            other => {
                let (w, h) = other.split_once(':')?;
                let aspect = Self::Custom { width: w.trim().parse().ok()?, height: h.trim().parse().ok()? };
                aspect.ratio().ok().map(|_| aspect)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CropShape {
    #[default]
    Rectangle,
    Circle,
}

/// Slider and drag state of the cropper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropSettings {
    /// Zoom in percent.
    pub scale: f32,
    /// Clockwise rotation in degrees.
    pub rotation: f32,
    /// Horizontal pan in output pixels.
    pub offset_x: f32,
    /// Vertical pan in output pixels.
    pub offset_y: f32,
    pub aspect: AspectRatio,
    pub shape: CropShape,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE_PERCENT,
            rotation: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            aspect: AspectRatio::default(),
            shape: CropShape::default(),
        }
    }
}

impl CropSettings {
    /// Restore zoom, rotation, and pan. Aspect and shape are kept.
    pub fn reset(&mut self) {
        self.scale = DEFAULT_SCALE_PERCENT;
        self.rotation = 0.0;
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    /// Copy with every adjustment brought into range.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            scale: if self.scale.is_finite() {
                self.scale.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT)
            } else {
                DEFAULT_SCALE_PERCENT
            },
            rotation: wrap_degrees(self.rotation),
            offset_x: finite_or_zero(self.offset_x),
            offset_y: finite_or_zero(self.offset_y),
            ..self
        }
    }

    /// Output dimensions for a given width; height follows the aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns `ZeroWidth`, `InvalidAspect`, or `TooLarge`.
    pub fn output_size(&self, output_width: u32) -> Result<(u32, u32), CropError> {
        if output_width == 0 {
            return Err(CropError::ZeroWidth);
        }
        let ratio = self.aspect.ratio()?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let height = (f64::from(output_width) / f64::from(ratio)).round().max(1.0) as u32;
        if output_width > MAX_EDGE_PX || height > MAX_EDGE_PX {
            return Err(CropError::TooLarge { width: output_width, height });
        }
        Ok((output_width, height))
    }
}

/// Wrap into (-180, 180]. Non-finite input becomes 0.
fn wrap_degrees(deg: f32) -> f32 {
    if !deg.is_finite() {
        return 0.0;
    }
    let mut r = deg % 360.0;
    if r <= -180.0 {
        r += 360.0;
    } else if r > 180.0 {
        r -= 360.0;
    }
    r
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Affine transform from source pixels to output pixels.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn crop_transform(settings: &CropSettings, source: (u32, u32), output: (u32, u32)) -> Transform {
    let s = settings.normalized();
    let (sw, sh) = (source.0 as f32, source.1 as f32);
    let (ow, oh) = (output.0 as f32, output.1 as f32);

    let cover = (ow / sw).max(oh / sh);
    let zoom = cover * s.scale / 100.0;

    Transform::from_translate(ow / 2.0 + s.offset_x, oh / 2.0 + s.offset_y)
        .pre_rotate(s.rotation)
        .pre_scale(zoom, zoom)
        .pre_translate(-sw / 2.0, -sh / 2.0)
}

/// Crop `source` into a new image `output_width` wide.
///
/// # Errors
///
/// Returns an error for an empty source, bad dimensions, or a failed
/// canvas allocation.
pub fn crop(source: &DynamicImage, settings: &CropSettings, output_width: u32) -> Result<RgbaImage, CropError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(CropError::EmptySource);
    }
    let (ow, oh) = settings.output_size(output_width)?;

    let src = to_pixmap(&source.to_rgba8()).ok_or(CropError::EmptySource)?;
    let mut canvas = Pixmap::new(ow, oh).ok_or(CropError::Canvas)?;

    let mask = match settings.shape {
        CropShape::Rectangle => None,
        CropShape::Circle => Some(circle_mask(ow, oh)?),
    };

    let paint = PixmapPaint { opacity: 1.0, blend_mode: BlendMode::SourceOver, quality: FilterQuality::Bicubic };
    let transform = crop_transform(settings, (src.width(), src.height()), (ow, oh));
    canvas.draw_pixmap(0, 0, src.as_ref(), &paint, transform, mask.as_ref());

    tracing::debug!(
        width = ow,
        height = oh,
        scale = settings.scale,
        rotation = settings.rotation,
        "image cropped"
    );
    Ok(from_pixmap(&canvas))
}

#[allow(clippy::cast_precision_loss)]
fn circle_mask(width: u32, height: u32) -> Result<Mask, CropError> {
    let mut mask = Mask::new(width, height).ok_or(CropError::Canvas)?;
    let oval = Rect::from_xywh(0.0, 0.0, width as f32, height as f32).ok_or(CropError::Canvas)?;
    let path = PathBuilder::from_oval(oval).ok_or(CropError::Canvas)?;
    mask.fill_path(&path, tiny_skia::FillRule::Winding, true, Transform::identity());
    Ok(mask)
}

#[cfg(test)]
#[path = "crop_test.rs"]
mod tests;
