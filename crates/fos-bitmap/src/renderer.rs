//! Bitmap renderer
//!
//! Owns the currently loaded image and ties decoding, caching and drawing
//! together. A renderer is mutated by one owner at a time; the bitmap it
//! hands out is a copy-on-write clone, never a mutable alias.

use std::io::Read;

use crate::bitmap::CanonicalBitmap;
use crate::cache::{EncodedImage, RawCache};
use crate::compositor;
use crate::config::{DecodeLimits, RendererConfig};
use crate::decoder::{DecoderRegistry, DefensiveDecoder};
use crate::error::{DecodeError, RenderError};
use crate::surface::Surface;
use crate::transform::{apply_alpha, scale};
use crate::{Anchor, ClipInsets, Rect};

/// Renderer for JPEG, PNG, GIF and BMP images
#[derive(Debug)]
pub struct BitmapRenderer {
    registry: DecoderRegistry,
    limits: DecodeLimits,
    image: Option<CanonicalBitmap>,
    cache: RawCache,
}

impl BitmapRenderer {
    /// Create a renderer with the built-in decoders
    pub fn new() -> Self {
        Self::with_config(RendererConfig::default())
    }

    pub fn with_config(config: RendererConfig) -> Self {
        Self {
            registry: DecoderRegistry::default(),
            limits: config.limits,
            image: None,
            cache: RawCache::new(config.cache_input),
        }
    }

    /// Replace the decoder registry
    pub fn with_registry(mut self, registry: DecoderRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Whether `content_type` is a supported image type
    pub fn can_render(&self, content_type: &str) -> bool {
        DecoderRegistry::can_render(content_type)
    }

    /// Decode `data` and make it the current image.
    ///
    /// An unsupported content type clears the current image and is not an
    /// error. On failure the previous image stays loaded.
    pub fn load_image(&mut self, data: &[u8], content_type: &str) -> Result<(), DecodeError> {
        self.cache.store(data, content_type);
        let decoded = DefensiveDecoder::new(&self.registry)
            .with_limits(self.limits)
            .decode(data, content_type)?;

        if let Some(bitmap) = &decoded {
            tracing::debug!("Loaded {}x{} {} image", bitmap.width(), bitmap.height(), content_type);
        }
        self.image = decoded;
        Ok(())
    }

    /// Read `reader` to the end, then [`load_image`](Self::load_image)
    pub fn load_image_from_reader(&mut self, mut reader: impl Read, content_type: &str) -> Result<(), DecodeError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.load_image(&data, content_type)
    }

    /// Current image
    pub fn image(&self) -> Option<&CanonicalBitmap> {
        self.image.as_ref()
    }

    /// Current image resampled to the given size
    pub fn scaled_image(&self, width: f64, height: f64) -> Option<CanonicalBitmap> {
        self.image.as_ref().map(|img| scale(img, width, height))
    }

    /// Multiply the opacity of the current image.
    ///
    /// Without an image this leaves a transparent 1×1 placeholder.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.image = Some(apply_alpha(self.image.as_ref(), alpha));
    }

    pub fn bounds(&self) -> Rect {
        compositor::bounds(self.image.as_ref())
    }

    pub fn native_bounds(&self) -> Result<Rect, RenderError> {
        compositor::native_bounds(self.image.as_ref())
    }

    /// Draw the whole image into `anchor`
    pub fn draw_image<S: Surface + ?Sized>(&self, surface: &mut S, anchor: &Anchor) -> bool {
        self.draw_image_clipped(surface, anchor, None)
    }

    /// Draw the image into `anchor` with `clip` trimmed from its edges
    pub fn draw_image_clipped<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        anchor: &Anchor,
        clip: Option<&ClipInsets>,
    ) -> bool {
        compositor::draw_clipped(surface, self.image.as_ref(), anchor, clip)
    }

    /// Enable or disable caching of the encoded input.
    ///
    /// Disabling drops whatever is cached.
    pub fn set_cache_input(&mut self, enable: bool) {
        self.cache.set_enabled(enable);
    }

    pub fn cached(&self) -> Option<&EncodedImage> {
        self.cache.get()
    }

    pub fn cached_image(&self) -> Option<&[u8]> {
        self.cache.bytes()
    }

    pub fn cached_content_type(&self) -> Option<&str> {
        self.cache.content_type()
    }
}

impl Default for BitmapRenderer {
    fn default() -> Self {
        Self::new()
    }
}
