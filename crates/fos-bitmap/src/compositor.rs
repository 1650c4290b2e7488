//! Anchored drawing and bounds
//!
//! Places a bitmap on a surface so that the part left after trimming the
//! clip insets exactly fills the anchor rectangle.

use crate::bitmap::CanonicalBitmap;
use crate::error::RenderError;
use crate::surface::{ClipScope, Surface};
use crate::transform::AffineTransform;
use crate::{Anchor, ClipInsets, Rect};

/// Transform that maps the visible part of an `iw` × `ih` image onto `anchor`.
///
/// The trimmed edges land outside the anchor; restricting the surface clip
/// to the anchor hides them.
pub fn clip_transform(iw: u32, ih: u32, anchor: &Anchor, clip: &ClipInsets) -> AffineTransform {
    let full = ClipInsets::FULL_SCALE as f64;
    let (iw, ih) = (iw as f64, ih as f64);

    let cw = (full - clip.left as f64 - clip.right as f64) / full;
    let ch = (full - clip.top as f64 - clip.bottom as f64) / full;
    let sx = anchor.width / (iw * cw);
    let sy = anchor.height / (ih * ch);
    let tx = anchor.x - iw * sx * clip.left as f64 / full;
    let ty = anchor.y - ih * sy * clip.top as f64 / full;

    AffineTransform::new(sx, sy, tx, ty)
}

/// Draw `bitmap` into `anchor`, trimming `clip` from its edges.
///
/// Returns `false` without touching the surface when there is no bitmap.
/// With insets, the surface clip is narrowed to the anchor for this draw
/// only.
pub fn draw_clipped<S: Surface + ?Sized>(
    surface: &mut S,
    bitmap: Option<&CanonicalBitmap>,
    anchor: &Anchor,
    clip: Option<&ClipInsets>,
) -> bool {
    let Some(bitmap) = bitmap else {
        return false;
    };

    let insets = clip.copied().unwrap_or_default();
    let transform = clip_transform(bitmap.width(), bitmap.height(), anchor, &insets);

    let mut scope = match clip {
        Some(_) => ClipScope::narrowed(surface, *anchor),
        None => ClipScope::new(surface),
    };
    scope.draw_transformed(bitmap, transform);
    true
}

/// `{0, 0, width, height}`, or the empty rectangle without a bitmap
pub fn bounds(bitmap: Option<&CanonicalBitmap>) -> Rect {
    bitmap.map_or(Rect::EMPTY, bitmap_rect)
}

/// Like [`bounds`], but a missing bitmap is an error
pub fn native_bounds(bitmap: Option<&CanonicalBitmap>) -> Result<Rect, RenderError> {
    bitmap.map(bitmap_rect).ok_or(RenderError::NoImageLoaded)
}

fn bitmap_rect(bitmap: &CanonicalBitmap) -> Rect {
    Rect::new(0.0, 0.0, bitmap.width() as f64, bitmap.height() as f64)
}
