//! Canonical pixel buffer
//!
//! Every decoded image ends up here: packed `0xAARRGGBB` words, row-major,
//! non-premultiplied, with a defined alpha channel on every pixel.

use std::sync::Arc;

/// Opaque black, the filler some decoders leave past a truncation point
pub const OPAQUE_BLACK: u32 = 0xFF00_0000;

/// Fully transparent pixel
pub const TRANSPARENT: u32 = 0x0000_0000;

/// Pack channels into an ARGB word
#[inline]
pub const fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Split an ARGB word into `[a, r, g, b]`
#[inline]
pub const fn unpack_argb(pixel: u32) -> [u8; 4] {
    [
        (pixel >> 24) as u8,
        (pixel >> 16) as u8,
        (pixel >> 8) as u8,
        pixel as u8,
    ]
}

/// Bitmap in the canonical ARGB format.
///
/// Pixel storage is shared between clones and copied on first write, so a
/// clone handed out by [`crate::scale`] or [`crate::apply_alpha`] can never
/// alias a buffer someone else mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBitmap {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u32>>,
}

impl CanonicalBitmap {
    /// Create a fully transparent bitmap
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    /// Create a bitmap where every pixel has the same value
    pub fn filled(width: u32, height: u32, pixel: u32) -> Self {
        Self {
            width,
            height,
            pixels: Arc::new(vec![pixel; pixel_count(width, height)]),
        }
    }

    /// Wrap existing pixels. Returns `None` if the length does not match.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        if pixels.len() != pixel_count(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// Wrap pixels already known to match the dimensions
    pub(crate) fn from_vec(width: u32, height: u32, pixels: Vec<u32>) -> Self {
        debug_assert_eq!(pixels.len(), pixel_count(width, height));
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    /// Build a bitmap by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u32) -> Self {
        let mut pixels = Vec::with_capacity(pixel_count(width, height));
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels: Arc::new(pixels),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Row-major pixel words
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Mutable pixels. Detaches from any clone still sharing the storage.
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        Arc::make_mut(&mut self.pixels).as_mut_slice()
    }

    /// Consume into the raw pixel vector
    pub fn into_pixels(self) -> Vec<u32> {
        Arc::try_unwrap(self.pixels).unwrap_or_else(|shared| (*shared).clone())
    }

    /// One row of pixels, or `None` past the last row
    pub fn row(&self, y: u32) -> Option<&[u32]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.width as usize;
        self.pixels.get(start..start + self.width as usize)
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Set pixel at (x, y); out of range writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: u32) {
        if x < self.width && y < self.height {
            let idx = y as usize * self.width as usize + x as usize;
            self.pixels_mut()[idx] = pixel;
        }
    }

    /// True when both bitmaps point at the same pixel storage
    pub fn shares_storage(&self, other: &CanonicalBitmap) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Memory size in bytes
    pub fn memory_size(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<u32>()
    }
}

pub(crate) fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
