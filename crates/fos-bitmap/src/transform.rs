//! Bitmap transforms
//!
//! Scaling and opacity. Both return fresh buffers, except for the two
//! documented fast paths which hand back a clone sharing the input storage.

use tiny_skia::{BlendMode, FilterQuality, Pixmap, PixmapPaint};

use crate::bitmap::{pack_argb, unpack_argb, CanonicalBitmap};
use crate::surface::{from_pixmap, to_pixmap};

/// Scale + translate matrix
///
/// | sx 0  tx |
/// | 0  sy ty |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn identity() -> Self {
        Self { sx: 1.0, sy: 1.0, tx: 0.0, ty: 0.0 }
    }

    pub const fn new(sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self { sx, sy, tx, ty }
    }

    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, sy, 0.0, 0.0)
    }

    /// Map a source point to destination coordinates
    pub fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.sx + self.tx, y * self.sy + self.ty)
    }

    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(self.sx as f32, 0.0, 0.0, self.sy as f32, self.tx as f32, self.ty as f32)
    }
}

/// Resample to `new_width` × `new_height` with bilinear filtering.
///
/// Requesting the current size returns a clone sharing the same pixels.
/// Fractional sizes are truncated.
///
/// Resampling happens on premultiplied 8-bit pixels, so the color of
/// translucent pixels is quantized: the lower the alpha, the coarser the
/// color. Fully transparent pixels come back black.
pub fn scale(bitmap: &CanonicalBitmap, new_width: f64, new_height: f64) -> CanonicalBitmap {
    let (old_width, old_height) = (bitmap.width() as f64, bitmap.height() as f64);
    if new_width == old_width && new_height == old_height {
        return bitmap.clone();
    }

    let (width, height) = (new_width as u32, new_height as u32);
    let (Some(source), Some(mut target)) = (to_pixmap(bitmap), Pixmap::new(width, height)) else {
        return CanonicalBitmap::new(width, height);
    };

    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        blend_mode: BlendMode::Source,
        ..PixmapPaint::default()
    };
    let transform = AffineTransform::scale(new_width / old_width, new_height / old_height);
    target.draw_pixmap(0, 0, source.as_ref(), &paint, transform.to_skia(), None);

    from_pixmap(&target)
}

/// Multiply the alpha channel of every pixel by `alpha`, colors untouched.
///
/// A missing bitmap yields a transparent 1×1 bitmap. `alpha == 0.0` leaves
/// the input as it is rather than making it invisible.
pub fn apply_alpha(bitmap: Option<&CanonicalBitmap>, alpha: f64) -> CanonicalBitmap {
    let Some(bitmap) = bitmap else {
        return CanonicalBitmap::new(1, 1);
    };
    if alpha == 0.0 {
        return bitmap.clone();
    }

    let pixels = bitmap
        .pixels()
        .iter()
        .map(|&pixel| {
            let [a, r, g, b] = unpack_argb(pixel);
            let scaled = (a as f64 * alpha).clamp(0.0, 255.0) as u8;
            pack_argb(scaled, r, g, b)
        })
        .collect();
    CanonicalBitmap::from_vec(bitmap.width(), bitmap.height(), pixels)
}
