//! Decoder capability interface and the defensive decode driver
//!
//! A [`Decoder`] wraps one codec. The [`DecoderRegistry`] picks candidates
//! by content type and the [`DefensiveDecoder`] runs each candidate through
//! its fallback modes until one of them produces pixels.

mod codecs;
mod defensive;
mod registry;

use std::io::Cursor;

pub use codecs::ImageCodec;
pub use defensive::{find_truncated_boundary, DefensiveDecoder, RecoveryOutcome};
pub use registry::DecoderRegistry;

use crate::bitmap::{pixel_count, CanonicalBitmap};
use crate::config::DecodeLimits;
use crate::error::CodecError;

/// Seekable stream handed to decoders
pub type ByteStream<'a> = Cursor<&'a [u8]>;

/// In-memory encoded bytes that can be reopened from the start at any time.
///
/// Codecs are not guaranteed to be restartable in place, so every decode
/// mode gets its own stream from [`ByteSource::open`].
#[derive(Debug, Clone, Copy)]
pub struct ByteSource<'a> {
    data: &'a [u8],
}

impl<'a> ByteSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Fresh stream positioned at the first byte
    pub fn open(&self) -> ByteStream<'a> {
        Cursor::new(self.data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decoder fallback strategy, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// Default parameters
    Standard,
    /// Force a single-channel gray destination when the decoder offers one
    GrayFallback,
    /// Decode into a preallocated buffer and keep whatever rows arrived
    TruncatedRecovery,
}

impl DecodeMode {
    pub const ALL: [DecodeMode; 3] = [Self::Standard, Self::GrayFallback, Self::TruncatedRecovery];
}

/// Native pixel layout of a [`RasterBuffer`]
///
/// 16-bit and float samples are stored in native byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Gray8,
    GrayAlpha8,
    Rgb8,
    Rgba8,
    Gray16,
    GrayAlpha16,
    Rgb16,
    Rgba16,
    Rgb32F,
    Rgba32F,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            Self::Gray8 | Self::Gray16 => 1,
            Self::GrayAlpha8 | Self::GrayAlpha16 => 2,
            Self::Rgb8 | Self::Rgb16 | Self::Rgb32F => 3,
            Self::Rgba8 | Self::Rgba16 | Self::Rgba32F => 4,
        }
    }

    pub fn bytes_per_channel(self) -> usize {
        match self {
            Self::Gray8 | Self::GrayAlpha8 | Self::Rgb8 | Self::Rgba8 => 1,
            Self::Gray16 | Self::GrayAlpha16 | Self::Rgb16 | Self::Rgba16 => 2,
            Self::Rgb32F | Self::Rgba32F => 4,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.channels() * self.bytes_per_channel()
    }

    pub fn has_alpha(self) -> bool {
        matches!(self.channels(), 2 | 4)
    }

    /// Single-channel gray, the target of [`DecodeMode::GrayFallback`]
    pub fn is_gray(self) -> bool {
        self.channels() == 1
    }

    pub(crate) fn from_color_type(color: image::ColorType) -> Result<Self, CodecError> {
        use image::ColorType;
        Ok(match color {
            ColorType::L8 => Self::Gray8,
            ColorType::La8 => Self::GrayAlpha8,
            ColorType::Rgb8 => Self::Rgb8,
            ColorType::Rgba8 => Self::Rgba8,
            ColorType::L16 => Self::Gray16,
            ColorType::La16 => Self::GrayAlpha16,
            ColorType::Rgb16 => Self::Rgb16,
            ColorType::Rgba16 => Self::Rgba16,
            ColorType::Rgb32F => Self::Rgb32F,
            ColorType::Rgba32F => Self::Rgba32F,
            other => return Err(CodecError::UnsupportedLayout(format!("{other:?}"))),
        })
    }
}

/// Decoder-native pixel buffer
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl RasterBuffer {
    /// Zero-filled buffer sized for `width * height` pixels of `layout`.
    ///
    /// Sizes come from untrusted headers, so the buffer is checked against
    /// `limits` and allocated fallibly.
    pub fn allocate(width: u32, height: u32, layout: PixelLayout, limits: &DecodeLimits) -> Result<Self, CodecError> {
        limits.check(width, height)?;
        let bytes = (width as u64)
            .checked_mul(height as u64)
            .and_then(|n| n.checked_mul(layout.bytes_per_pixel() as u64))
            .ok_or(CodecError::LimitExceeded("buffer size overflows"))?;
        limits.check_memory(bytes)?;

        let len = usize::try_from(bytes).map_err(|_| CodecError::LimitExceeded("buffer size overflows"))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| CodecError::LimitExceeded("buffer allocation failed"))?;
        data.resize(len, 0);
        Ok(Self { width, height, layout, data })
    }

    /// Wrap decoded bytes, checking the length
    pub fn from_raw(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Result<Self, CodecError> {
        let expected = pixel_count(width, height) * layout.bytes_per_pixel();
        if data.len() != expected {
            return Err(CodecError::BufferSize { expected, actual: data.len() });
        }
        Ok(Self { width, height, layout, data })
    }

    pub fn stride(&self) -> usize {
        self.width as usize * self.layout.bytes_per_pixel()
    }

    /// Pixel at (x, y) converted to canonical ARGB
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.layout.bytes_per_pixel();
        let start = (y as usize * self.width as usize + x as usize) * bpp;
        self.data
            .get(start..start + bpp)
            .map(|bytes| crate::normalize::convert_pixel(bytes, self.layout))
    }
}

/// What a decoder hands back: either already canonical or in its own layout
#[derive(Debug, Clone, PartialEq)]
pub enum NativeBuffer {
    Canonical(CanonicalBitmap),
    Raster(RasterBuffer),
}

impl NativeBuffer {
    pub fn width(&self) -> u32 {
        match self {
            Self::Canonical(bmp) => bmp.width(),
            Self::Raster(raster) => raster.width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Canonical(bmp) => bmp.height(),
            Self::Raster(raster) => raster.height,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, Self::Canonical(_))
    }
}

/// Codec capability consumed by the defensive decoder.
///
/// Every method receives a stream that may already have been read from;
/// implementations seek to wherever they need to start.
pub trait Decoder: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether this decoder attempts streams of `content_type`
    fn can_decode(&self, content_type: &str) -> bool;

    /// Declared dimensions, read from the header only
    fn dimensions(&self, stream: &mut ByteStream<'_>) -> Result<(u32, u32), CodecError>;

    /// Native layouts the decoder can produce, default first
    fn pixel_layouts(&self, stream: &mut ByteStream<'_>) -> Result<Vec<PixelLayout>, CodecError>;

    /// Decode the first image, optionally forcing the destination layout.
    ///
    /// Buffers sized from the header must respect `limits`.
    fn decode(
        &self,
        stream: &mut ByteStream<'_>,
        layout: Option<PixelLayout>,
        limits: &DecodeLimits,
    ) -> Result<NativeBuffer, CodecError>;

    /// Decode into `dest`. Rows written before an error stay in `dest`.
    fn decode_into(&self, stream: &mut ByteStream<'_>, dest: &mut RasterBuffer) -> Result<(), CodecError>;
}
