//! Raster work: cropping, frame animation, and export encodings.
//!
//! DESIGN
//! ======
//! Decoding and encoding go through `image`; affine drawing goes through
//! `tiny-skia`, which wants premultiplied RGBA. The two conversions below
//! are the only place pixels cross between the libraries.

pub mod animation;
pub mod crop;
pub mod export;

use image::{Rgba, RgbaImage};
use tiny_skia::{ColorU8, Pixmap};

/// Largest edge, in pixels, accepted for decoded or generated images.
pub const MAX_EDGE_PX: u32 = 4096;

/// Copy straight-alpha RGBA into a premultiplied pixmap.
///
/// Returns `None` for zero-sized images.
#[must_use]
pub fn to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Copy a premultiplied pixmap back to straight-alpha RGBA.
#[must_use]
pub fn from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
