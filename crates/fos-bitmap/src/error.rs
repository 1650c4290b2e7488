//! Error types

use crate::decoder::DecodeMode;

/// Error raised by a single decoder attempt
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unsupported pixel layout: {0}")]
    UnsupportedLayout(String),
    #[error("Decoder advertises no pixel layouts")]
    NoPixelLayouts,
    #[error("Destination buffer is {actual} bytes, decoder needs {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error("Limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("Decode failed: {0}")]
    Malformed(String),
}

/// Image could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Every mode of every candidate decoder failed
    #[error("{decoder} decoder failed in {mode:?} mode: {source}")]
    Failed {
        decoder: &'static str,
        mode: DecodeMode,
        #[source]
        source: CodecError,
    },
    /// The input stream could not be read into memory
    #[error("Failed to read image data: {0}")]
    Read(#[from] std::io::Error),
}

impl DecodeError {
    /// The decoder error behind a failed decode
    pub fn cause(&self) -> Option<&CodecError> {
        match self {
            Self::Failed { source, .. } => Some(source),
            Self::Read(_) => None,
        }
    }
}

/// Renderer state errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("No image loaded")]
    NoImageLoaded,
    #[error("Invalid surface size {width}x{height}")]
    InvalidSurfaceSize { width: u32, height: u32 },
}
