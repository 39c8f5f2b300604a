//! Multi-frame signature animation.
//!
//! Frames are the source image redrawn at a linearly interpolated opacity
//! and scale. They are plain values owned by the caller; nothing here keeps
//! them alive.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tiny_skia::{BlendMode, Color, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::error::ErrorCode;
use crate::imaging::export::frame_file_name;
use crate::imaging::{from_pixmap, to_pixmap};

pub const MIN_FRAMES: u32 = 2;
pub const MAX_FRAMES: u32 = 60;
pub const DEFAULT_FRAMES: u32 = 10;
pub const DEFAULT_START_SCALE: f32 = 0.8;
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;
pub const MAX_FRAME_DELAY_MS: u32 = 10_000;
/// Longest side of an animated source.
pub const MAX_ANIMATION_EDGE_PX: u32 = 1024;
/// Pixels across all frames of one animation (64 MiB of RGBA).
pub const MAX_ANIMATION_PIXELS: u64 = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AnimationError {
    #[error("frame count {0} outside {min}..={max}", min = MIN_FRAMES, max = MAX_FRAMES)]
    FrameCount(u32),
    #[error("start scale {0} outside (0, 1]")]
    StartScale(f32),
    #[error("frame delay {0}ms outside 1..={max}", max = MAX_FRAME_DELAY_MS)]
    FrameDelay(u32),
    #[error("source image is empty")]
    EmptySource,
    #[error(
        "{width}x{height} source with {frames} frames exceeds the animation budget \
         ({max_edge}px per side, {max_pixels} pixels total)",
        max_edge = MAX_ANIMATION_EDGE_PX,
        max_pixels = MAX_ANIMATION_PIXELS
    )]
    TooLarge { width: u32, height: u32, frames: u32 },
    #[error("canvas allocation failed")]
    Canvas,
}

impl ErrorCode for AnimationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::FrameCount(_) => "E_FRAME_COUNT",
            Self::StartScale(_) => "E_START_SCALE",
            Self::FrameDelay(_) => "E_FRAME_DELAY",
            Self::EmptySource => "E_EMPTY_SOURCE",
            Self::TooLarge { .. } => "E_ANIMATION_TOO_LARGE",
            Self::Canvas => "E_CANVAS",
        }
    }

    fn status(&self) -> axum::http::StatusCode {
        match self {
            Self::Canvas => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            Self::TooLarge { .. } => axum::http::StatusCode::PAYLOAD_TOO_LARGE,
            _ => axum::http::StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationEffect {
    /// Opacity 0 → 1.
    Fade,
    /// Scale `start_scale` → 1.
    Zoom,
    #[default]
    FadeZoom,
}

impl AnimationEffect {
    fn fades(self) -> bool {
        matches!(self, Self::Fade | Self::FadeZoom)
    }

    fn zooms(self) -> bool {
        matches!(self, Self::Zoom | Self::FadeZoom)
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fade" => Some(Self::Fade),
            "zoom" => Some(Self::Zoom),
            "fade-zoom" | "fadezoom" => Some(Self::FadeZoom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationSpec {
    pub frame_count: u32,
    pub effect: AnimationEffect,
    pub start_scale: f32,
    pub frame_delay_ms: u32,
    /// Straight-alpha RGBA fill behind the image. Transparent when absent.
    pub background: Option<[u8; 4]>,
}

impl Default for AnimationSpec {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAMES,
            effect: AnimationEffect::default(),
            start_scale: DEFAULT_START_SCALE,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
            background: None,
        }
    }
}

impl AnimationSpec {
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub fn validate(&self) -> Result<(), AnimationError> {
        if !(MIN_FRAMES..=MAX_FRAMES).contains(&self.frame_count) {
            return Err(AnimationError::FrameCount(self.frame_count));
        }
        if !(self.start_scale.is_finite() && self.start_scale > 0.0 && self.start_scale <= 1.0) {
            return Err(AnimationError::StartScale(self.start_scale));
        }
        if !(1..=MAX_FRAME_DELAY_MS).contains(&self.frame_delay_ms) {
            return Err(AnimationError::FrameDelay(self.frame_delay_ms));
        }
        Ok(())
    }

    /// Reject sources whose frames would not fit the pixel budget.
    ///
    /// # Errors
    ///
    /// Returns `TooLarge` when either side exceeds [`MAX_ANIMATION_EDGE_PX`]
    /// or all frames together exceed [`MAX_ANIMATION_PIXELS`].
    pub fn check_budget(&self, width: u32, height: u32) -> Result<(), AnimationError> {
        let total = u64::from(width) * u64::from(height) * u64::from(self.frame_count);
        if width > MAX_ANIMATION_EDGE_PX || height > MAX_ANIMATION_EDGE_PX || total > MAX_ANIMATION_PIXELS {
            return Err(AnimationError::TooLarge { width, height, frames: self.frame_count });
        }
        Ok(())
    }
}

/// Per-frame drawing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub opacity: f32,
    pub scale: f32,
}

/// One generated frame. `index` is 1-based.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub index: usize,
    pub file_name: String,
    pub image: RgbaImage,
}

/// Linear interpolation for frame `index` (0-based) of `spec.frame_count`.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn interpolate(spec: &AnimationSpec, index: u32) -> FrameParams {
    let last = spec.frame_count.saturating_sub(1).max(1);
    let t = (index.min(last) as f32) / (last as f32);

    let opacity = if spec.effect.fades() { t } else { 1.0 };
    let scale = if spec.effect.zooms() { spec.start_scale + (1.0 - spec.start_scale) * t } else { 1.0 };
    FrameParams { opacity, scale }
}

/// Render every frame of the animation.
///
/// # Errors
///
/// Returns an error for an invalid spec, an empty source, or a failed
/// canvas allocation.
#[allow(clippy::cast_precision_loss)]
pub fn generate_frames(source: &RgbaImage, spec: &AnimationSpec) -> Result<Vec<RenderedFrame>, AnimationError> {
    spec.validate()?;
    spec.check_budget(source.width(), source.height())?;
    let src = to_pixmap(source).ok_or(AnimationError::EmptySource)?;
    let (w, h) = (src.width(), src.height());
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);

    let background = spec
        .background
        .map_or(Color::TRANSPARENT, |[r, g, b, a]| Color::from_rgba8(r, g, b, a));

    let mut frames = Vec::with_capacity(spec.frame_count as usize);
    for i in 0..spec.frame_count {
        let params = interpolate(spec, i);

        let mut canvas = Pixmap::new(w, h).ok_or(AnimationError::Canvas)?;
        canvas.fill(background);

        let paint = PixmapPaint {
            opacity: params.opacity,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        let transform = Transform::from_translate(cx, cy)
            .pre_scale(params.scale, params.scale)
            .pre_translate(-cx, -cy);
        canvas.draw_pixmap(0, 0, src.as_ref(), &paint, transform, None);

        let index = i as usize + 1;
        frames.push(RenderedFrame {
            index,
            file_name: frame_file_name(index),
            image: from_pixmap(&canvas),
        });
    }

    tracing::debug!(frames = frames.len(), effect = ?spec.effect, "animation frames generated");
    Ok(frames)
}

#[cfg(test)]
#[path = "animation_test.rs"]
mod tests;
