//! Pixel normalizer
//!
//! Converts whatever a decoder produced into the canonical ARGB format.
//! Layouts without alpha come out fully opaque. Conversion is total: a
//! buffer shorter than its dimensions claim reads the missing bytes as zero.

use crate::bitmap::{pack_argb, pixel_count, CanonicalBitmap};
use crate::decoder::{NativeBuffer, PixelLayout, RasterBuffer};

/// Bring a decoder buffer into canonical form.
///
/// Canonical input is returned as is, without copying.
pub fn normalize(native: NativeBuffer) -> CanonicalBitmap {
    match native {
        NativeBuffer::Canonical(bitmap) => bitmap,
        NativeBuffer::Raster(raster) => normalize_raster(&raster),
    }
}

/// Convert a native raster into a new canonical bitmap
pub fn normalize_raster(raster: &RasterBuffer) -> CanonicalBitmap {
    let layout = raster.layout;
    let bpp = layout.bytes_per_pixel();
    let count = pixel_count(raster.width, raster.height);

    let mut pixels = Vec::with_capacity(count);
    for i in 0..count {
        let start = i * bpp;
        let pixel = match raster.data.get(start..start + bpp) {
            Some(bytes) => convert_pixel(bytes, layout),
            None => {
                let mut padded = [0u8; 16];
                let tail = raster.data.get(start..).unwrap_or(&[]);
                padded[..tail.len()].copy_from_slice(tail);
                convert_pixel(&padded[..bpp], layout)
            }
        };
        pixels.push(pixel);
    }

    CanonicalBitmap::from_vec(raster.width, raster.height, pixels)
}

/// Convert one native pixel. `bytes` is exactly one pixel long.
pub(crate) fn convert_pixel(bytes: &[u8], layout: PixelLayout) -> u32 {
    let c = |i| sample(bytes, layout, i);
    match layout.channels() {
        1 => {
            let g = c(0);
            pack_argb(0xFF, g, g, g)
        }
        2 => {
            let g = c(0);
            pack_argb(c(1), g, g, g)
        }
        3 => pack_argb(0xFF, c(0), c(1), c(2)),
        _ => pack_argb(c(3), c(0), c(1), c(2)),
    }
}

/// Channel `i` scaled to 8 bits
fn sample(bytes: &[u8], layout: PixelLayout, i: usize) -> u8 {
    match layout.bytes_per_channel() {
        1 => bytes[i],
        2 => {
            let v = u16::from_ne_bytes([bytes[2 * i], bytes[2 * i + 1]]);
            ((v as u32 + 128) / 257) as u8
        }
        _ => {
            let o = 4 * i;
            let v = f32::from_ne_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
    }
}
