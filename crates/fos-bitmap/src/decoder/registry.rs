//! Content type to decoder lookup

use super::{Decoder, ImageCodec};
use crate::format::ImageFormat;

/// Ordered set of decoders, queried by content type.
///
/// Lookup order is registration order. `Default` registers the built-in
/// JPEG, PNG, GIF and BMP codecs.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn Decoder>>,
}

impl DecoderRegistry {
    /// Registry with no decoders
    pub fn new() -> Self {
        Self { decoders: Vec::new() }
    }

    /// Append a decoder with the lowest priority so far
    pub fn register(&mut self, decoder: Box<dyn Decoder>) {
        tracing::debug!("Registered {} decoder", decoder.name());
        self.decoders.push(decoder);
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.register(Box::new(decoder));
        self
    }

    /// Whether `content_type` is one of the supported image types
    pub fn can_render(content_type: &str) -> bool {
        ImageFormat::from_content_type(content_type).is_some()
    }

    /// Decoders willing to attempt `content_type`, in priority order
    pub fn candidates(&self, content_type: &str) -> Vec<&dyn Decoder> {
        self.decoders
            .iter()
            .filter(|d| d.can_decode(content_type))
            .map(|d| &**d)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        ImageFormat::ALL
            .into_iter()
            .fold(Self::new(), |registry, format| registry.with_decoder(ImageCodec::new(format)))
    }
}

impl std::fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.decoders.iter().map(|d| d.name())).finish()
    }
}
