//! fOS Bitmap - Defensive image decoding and compositing
//!
//! Turns encoded image bytes into a canonical ARGB bitmap and draws it.
//!
//! This crate provides:
//! - Content type negotiation and a pluggable decoder registry
//! - Multi-mode decoding that recovers truncated streams
//! - Pixel normalization into non-premultiplied ARGB
//! - Optional caching of the encoded input
//! - Scaling, opacity, and clip-inset anchored drawing on a tiny-skia surface

mod bitmap;
mod cache;
mod compositor;
mod config;
mod error;
mod format;
mod normalize;
mod renderer;
pub mod decoder;
pub mod surface;
pub mod transform;

pub use bitmap::{pack_argb, unpack_argb, CanonicalBitmap, OPAQUE_BLACK, TRANSPARENT};
pub use cache::{EncodedImage, RawCache};
pub use compositor::{bounds, clip_transform, draw_clipped, native_bounds};
pub use config::{DecodeLimits, RendererConfig, DEFAULT_MAX_MEMORY_BYTES};
pub use decoder::{
    ByteSource, DecodeMode, Decoder, DecoderRegistry, DefensiveDecoder, ImageCodec, NativeBuffer, PixelLayout,
    RasterBuffer, RecoveryOutcome,
};
pub use error::{CodecError, DecodeError, RenderError};
pub use format::ImageFormat;
pub use normalize::{normalize, normalize_raster};
pub use renderer::BitmapRenderer;
pub use surface::{ClipRegion, ClipScope, PixmapSurface, Surface};
pub use transform::{apply_alpha, scale, AffineTransform};

/// Axis-aligned rectangle in surface coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Destination rectangle for a draw
pub type Anchor = Rect;

impl Rect {
    pub const EMPTY: Rect = Rect { x: 0.0, y: 0.0, width: 0.0, height: 0.0 };

    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Overlap of two rectangles; zero-sized when they do not meet
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Rect::new(x, y, (right - x).max(0.0), (bottom - y).max(0.0))
    }
}

/// Edge trims in units of 1/100000 of the image size.
///
/// Opposite insets must sum to less than [`ClipInsets::FULL_SCALE`]; values
/// are used as given, never clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ClipInsets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ClipInsets {
    /// One whole image dimension
    pub const FULL_SCALE: i32 = 100_000;

    pub const NONE: ClipInsets = ClipInsets { left: 0, top: 0, right: 0, bottom: 0 };

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Whether some part of the image remains visible on both axes
    pub fn is_well_formed(&self) -> bool {
        (self.left as i64 + self.right as i64) < Self::FULL_SCALE as i64
            && (self.top as i64 + self.bottom as i64) < Self::FULL_SCALE as i64
    }
}
