//! Renderer configuration

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Renderer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Keep a copy of the encoded input for re-export
    pub cache_input: bool,
    /// Limits applied to every decode
    pub limits: DecodeLimits,
}

/// Upper bound on a single decode buffer unless configured otherwise
pub const DEFAULT_MAX_MEMORY_BYTES: u64 = 512 * 1024 * 1024;

/// Limits checked before buffers are allocated.
///
/// All limits are optional. The default only caps buffer memory at
/// [`DEFAULT_MAX_MEMORY_BYTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeLimits {
    /// Maximum image width in pixels
    pub max_width: Option<u32>,
    /// Maximum image height in pixels
    pub max_height: Option<u32>,
    /// Maximum total pixels (width × height)
    pub max_pixels: Option<u64>,
    /// Maximum size of one decoded buffer in bytes
    pub max_memory_bytes: Option<u64>,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: None,
            max_memory_bytes: Some(DEFAULT_MAX_MEMORY_BYTES),
        }
    }
}

impl DecodeLimits {
    /// No restrictions, not even on memory
    pub fn none() -> Self {
        Self {
            max_memory_bytes: None,
            ..Self::default()
        }
    }

    /// Check dimensions against every configured limit
    pub fn check(&self, width: u32, height: u32) -> Result<(), CodecError> {
        if self.max_width.is_some_and(|max| width > max) {
            return Err(CodecError::LimitExceeded("width exceeds limit"));
        }
        if self.max_height.is_some_and(|max| height > max) {
            return Err(CodecError::LimitExceeded("height exceeds limit"));
        }
        if self.max_pixels.is_some_and(|max| width as u64 * height as u64 > max) {
            return Err(CodecError::LimitExceeded("pixel count exceeds limit"));
        }
        Ok(())
    }

    /// Check a buffer size in bytes against the memory limit
    pub fn check_memory(&self, bytes: u64) -> Result<(), CodecError> {
        if self.max_memory_bytes.is_some_and(|max| bytes > max) {
            return Err(CodecError::LimitExceeded("memory allocation exceeds limit"));
        }
        Ok(())
    }
}
