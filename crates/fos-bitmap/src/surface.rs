//! Drawing surfaces
//!
//! The compositor only needs to draw a bitmap through a transform and to
//! read and replace the clip region. [`PixmapSurface`] does that on a
//! tiny-skia pixmap.

use std::ops::{Deref, DerefMut};

use tiny_skia::{ColorU8, FillRule, FilterQuality, Mask, PathBuilder, Pixmap, PixmapPaint, Transform};

use crate::bitmap::{pack_argb, unpack_argb, CanonicalBitmap};
use crate::error::RenderError;
use crate::transform::AffineTransform;
use crate::Rect;

/// Area a surface is allowed to draw into
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ClipRegion {
    #[default]
    Unbounded,
    Rect(Rect),
}

impl ClipRegion {
    /// Narrow the region to `rect`
    pub fn intersect(self, rect: Rect) -> Self {
        match self {
            Self::Unbounded => Self::Rect(rect),
            Self::Rect(current) => Self::Rect(current.intersect(&rect)),
        }
    }
}

/// 2D drawing target
pub trait Surface {
    /// Draw `bitmap` with its pixel (x, y) mapped through `transform`
    fn draw_transformed(&mut self, bitmap: &CanonicalBitmap, transform: AffineTransform);

    fn clip_region(&self) -> ClipRegion;

    fn set_clip_region(&mut self, region: ClipRegion);

    /// Narrow the current clip region to `rect`
    fn intersect_clip_region(&mut self, rect: Rect) {
        let region = self.clip_region().intersect(rect);
        self.set_clip_region(region);
    }
}

/// Restores the clip region a surface had when the scope was opened.
///
/// Restoration happens on drop, so it also runs when a draw panics.
pub struct ClipScope<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    saved: ClipRegion,
}

impl<'s, S: Surface + ?Sized> ClipScope<'s, S> {
    pub fn new(surface: &'s mut S) -> Self {
        let saved = surface.clip_region();
        Self { surface, saved }
    }

    /// Open a scope and narrow the clip to `rect`
    pub fn narrowed(surface: &'s mut S, rect: Rect) -> Self {
        let scope = Self::new(surface);
        scope.surface.intersect_clip_region(rect);
        scope
    }
}

impl<S: Surface + ?Sized> Deref for ClipScope<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for ClipScope<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface + ?Sized> Drop for ClipScope<'_, S> {
    fn drop(&mut self) {
        self.surface.set_clip_region(self.saved);
    }
}

/// Surface backed by a tiny-skia pixmap
pub struct PixmapSurface {
    pixmap: Pixmap,
    clip: ClipRegion,
}

impl PixmapSurface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSurfaceSize { width, height })?;
        Ok(Self {
            pixmap,
            clip: ClipRegion::Unbounded,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fill the whole surface with one ARGB color, ignoring the clip
    pub fn fill(&mut self, argb: u32) {
        let [a, r, g, b] = unpack_argb(argb);
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Read the surface back in canonical form
    pub fn to_bitmap(&self) -> CanonicalBitmap {
        from_pixmap(&self.pixmap)
    }

    fn clip_mask(&self) -> Option<Mask> {
        let ClipRegion::Rect(rect) = self.clip else {
            return None;
        };
        let mut mask = Mask::new(self.pixmap.width(), self.pixmap.height())?;
        // An empty clip leaves the mask blank, so nothing gets drawn
        if let Some(rect) = tiny_skia::Rect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32) {
            mask.fill_path(&PathBuilder::from_rect(rect), FillRule::Winding, false, Transform::identity());
        }
        Some(mask)
    }
}

impl Surface for PixmapSurface {
    fn draw_transformed(&mut self, bitmap: &CanonicalBitmap, transform: AffineTransform) {
        let Some(source) = to_pixmap(bitmap) else {
            return;
        };
        let mask = self.clip_mask();
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform.to_skia(), mask.as_ref());
    }

    fn clip_region(&self) -> ClipRegion {
        self.clip
    }

    fn set_clip_region(&mut self, region: ClipRegion) {
        self.clip = region;
    }
}

/// Premultiplied copy for tiny-skia. `None` for an empty bitmap.
pub(crate) fn to_pixmap(bitmap: &CanonicalBitmap) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width(), bitmap.height())?;
    for (dst, &src) in pixmap.pixels_mut().iter_mut().zip(bitmap.pixels()) {
        let [a, r, g, b] = unpack_argb(src);
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Demultiply a pixmap back into canonical ARGB
pub(crate) fn from_pixmap(pixmap: &Pixmap) -> CanonicalBitmap {
    let pixels = pixmap
        .pixels()
        .iter()
        .map(|p| {
            let c = p.demultiply();
            pack_argb(c.alpha(), c.red(), c.green(), c.blue())
        })
        .collect();
    CanonicalBitmap::from_vec(pixmap.width(), pixmap.height(), pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixmap_roundtrip_opaque() {
        let bmp = CanonicalBitmap::from_fn(3, 2, |x, y| pack_argb(0xFF, x as u8 * 50, y as u8 * 90, 7));
        let back = from_pixmap(&to_pixmap(&bmp).unwrap());
        assert_eq!(back, bmp);
    }

    #[test]
    fn test_empty_bitmap_has_no_pixmap() {
        assert!(to_pixmap(&CanonicalBitmap::new(0, 5)).is_none());
    }

    #[test]
    fn test_invalid_surface_size() {
        assert_eq!(
            PixmapSurface::new(0, 10).err(),
            Some(RenderError::InvalidSurfaceSize { width: 0, height: 10 })
        );
    }

    #[test]
    fn test_clip_scope_restores() {
        let mut surface = PixmapSurface::new(10, 10).unwrap();
        {
            let scope = ClipScope::narrowed(&mut surface, Rect::new(2.0, 2.0, 4.0, 4.0));
            assert_eq!(scope.clip_region(), ClipRegion::Rect(Rect::new(2.0, 2.0, 4.0, 4.0)));
        }
        assert_eq!(surface.clip_region(), ClipRegion::Unbounded);
    }

    #[test]
    fn test_clip_scope_restores_after_panic() {
        let mut surface = PixmapSurface::new(10, 10).unwrap();
        surface.set_clip_region(ClipRegion::Rect(Rect::new(0.0, 0.0, 8.0, 8.0)));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = ClipScope::narrowed(&mut surface, Rect::new(5.0, 5.0, 5.0, 5.0));
            panic!("draw failed");
        }));
        assert!(result.is_err());
        assert_eq!(surface.clip_region(), ClipRegion::Rect(Rect::new(0.0, 0.0, 8.0, 8.0)));
    }

    #[test]
    fn test_intersect_clip_region() {
        let mut surface = PixmapSurface::new(10, 10).unwrap();
        surface.intersect_clip_region(Rect::new(0.0, 0.0, 6.0, 6.0));
        surface.intersect_clip_region(Rect::new(4.0, 2.0, 6.0, 6.0));
        assert_eq!(surface.clip_region(), ClipRegion::Rect(Rect::new(4.0, 2.0, 2.0, 4.0)));
    }

    #[test]
    fn test_draw_honors_clip() {
        let mut surface = PixmapSurface::new(4, 4).unwrap();
        surface.set_clip_region(ClipRegion::Rect(Rect::new(0.0, 0.0, 2.0, 4.0)));
        surface.draw_transformed(&CanonicalBitmap::filled(4, 4, 0xFFFF_0000), AffineTransform::identity());

        let out = surface.to_bitmap();
        assert_eq!(out.get_pixel(1, 1), Some(0xFFFF_0000));
        assert_eq!(out.get_pixel(3, 1), Some(0));
    }
}
