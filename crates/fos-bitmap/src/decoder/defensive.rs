//! Defensive decode driver
//!
//! Runs every candidate decoder through the three [`DecodeMode`]s and keeps
//! the first buffer any of them produces. Truncated streams are not errors:
//! the rows that arrived before the cut are kept and the rest is left
//! transparent.

use super::{ByteSource, DecodeMode, Decoder, DecoderRegistry, NativeBuffer, RasterBuffer};
use crate::bitmap::{CanonicalBitmap, OPAQUE_BLACK, TRANSPARENT};
use crate::config::DecodeLimits;
use crate::error::{CodecError, DecodeError};
use crate::normalize::{normalize, normalize_raster};

/// Result of a single mode attempt
#[derive(Debug)]
pub enum RecoveryOutcome {
    /// The decoder produced a complete buffer
    Success(NativeBuffer),
    /// Only rows `[0, boundary)` were recovered; the rest is transparent
    PartialSuccess { bitmap: CanonicalBitmap, boundary: u32 },
    /// Nothing usable came out of this mode
    Failed(CodecError),
}

/// Drives the decoders of a registry through the fallback modes
#[derive(Debug, Clone, Copy)]
pub struct DefensiveDecoder<'r> {
    registry: &'r DecoderRegistry,
    limits: DecodeLimits,
}

impl<'r> DefensiveDecoder<'r> {
    pub fn new(registry: &'r DecoderRegistry) -> Self {
        Self {
            registry,
            limits: DecodeLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Decode `bytes` into a canonical bitmap.
    ///
    /// Returns `Ok(None)` when no registered decoder accepts `content_type`.
    /// Fails only once every mode of every candidate has failed, carrying the
    /// most recent cause.
    pub fn decode(&self, bytes: &[u8], content_type: &str) -> Result<Option<CanonicalBitmap>, DecodeError> {
        let source = ByteSource::new(bytes);
        let mut last_error = None;

        for decoder in self.registry.candidates(content_type) {
            for mode in DecodeMode::ALL {
                tracing::debug!("Decoding {} bytes with {} in {:?} mode", source.len(), decoder.name(), mode);
                match self.attempt(decoder, source, mode) {
                    RecoveryOutcome::Success(native) => {
                        return Ok(Some(normalize(native)));
                    }
                    RecoveryOutcome::PartialSuccess { bitmap, boundary } => {
                        tracing::warn!(
                            "Recovered {} of {} rows from truncated {} image",
                            boundary,
                            bitmap.height(),
                            content_type
                        );
                        return Ok(Some(bitmap));
                    }
                    RecoveryOutcome::Failed(err) => {
                        tracing::debug!("{} failed in {:?} mode: {}", decoder.name(), mode, err);
                        last_error = Some(DecodeError::Failed {
                            decoder: decoder.name(),
                            mode,
                            source: err,
                        });
                    }
                }
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => {
                tracing::warn!("Content-type: {} is not supported. Image ignored.", content_type);
                Ok(None)
            }
        }
    }

    /// Run one mode of one decoder against a fresh stream
    pub fn attempt(&self, decoder: &dyn Decoder, source: ByteSource<'_>, mode: DecodeMode) -> RecoveryOutcome {
        let result = match mode {
            DecodeMode::Standard => decoder.decode(&mut source.open(), None, &self.limits),
            DecodeMode::GrayFallback => {
                let mut stream = source.open();
                decoder.pixel_layouts(&mut stream).and_then(|layouts| {
                    let gray = layouts.into_iter().find(|l| l.is_gray());
                    decoder.decode(&mut stream, gray, &self.limits)
                })
            }
            DecodeMode::TruncatedRecovery => return self.recover_truncated(decoder, source),
        };

        match result.and_then(|native| self.limits.check(native.width(), native.height()).map(|()| native)) {
            Ok(native) => RecoveryOutcome::Success(native),
            Err(err) => RecoveryOutcome::Failed(err),
        }
    }

    /// Decode into a buffer sized from the header so partial rows survive
    fn recover_truncated(&self, decoder: &dyn Decoder, source: ByteSource<'_>) -> RecoveryOutcome {
        let mut stream = source.open();
        let (width, height) = match decoder.dimensions(&mut stream) {
            Ok(dims) => dims,
            Err(err) => return RecoveryOutcome::Failed(err),
        };
        let layout = match decoder.pixel_layouts(&mut stream).map(|l| l.first().copied()) {
            Ok(Some(layout)) => layout,
            Ok(None) => return RecoveryOutcome::Failed(CodecError::NoPixelLayouts),
            Err(err) => return RecoveryOutcome::Failed(err),
        };

        let mut dest = match RasterBuffer::allocate(width, height, layout, &self.limits) {
            Ok(dest) => dest,
            Err(err) => return RecoveryOutcome::Failed(err),
        };
        if let Err(err) = decoder.decode_into(&mut stream, &mut dest) {
            tracing::debug!("{} stopped early, keeping decoded rows: {}", decoder.name(), err);
        }
        finalize_truncated(dest)
    }
}

/// Blank everything below the truncated-tail artifact, if there is one
fn finalize_truncated(dest: RasterBuffer) -> RecoveryOutcome {
    let boundary = find_truncated_boundary(dest.width, dest.height, |x, y| dest.pixel(x, y).unwrap_or(TRANSPARENT));
    if boundary >= dest.height {
        return RecoveryOutcome::Success(NativeBuffer::Raster(dest));
    }

    let mut bitmap = normalize_raster(&dest);
    let keep = boundary as usize * dest.width as usize;
    bitmap.pixels_mut()[keep..].fill(TRANSPARENT);
    RecoveryOutcome::PartialSuccess { bitmap, boundary }
}

/// Find where a solid black tail starts.
///
/// Rows are scanned from the bottom up, sampling columns right to left every
/// `width / 10` pixels. Returns one past the lowest row holding a sampled
/// pixel that is not opaque black, `0` if every sampled pixel is black, and
/// `height` when the last row already has content.
pub fn find_truncated_boundary(width: u32, height: u32, pixel: impl Fn(u32, u32) -> u32) -> u32 {
    if width == 0 {
        return height;
    }
    let stride = (width / 10).max(1);
    for y in (0..height).rev() {
        let mut x = width - 1;
        loop {
            if pixel(x, y) != OPAQUE_BLACK {
                return y + 1;
            }
            if x < stride {
                break;
            }
            x -= stride;
        }
    }
    0
}
