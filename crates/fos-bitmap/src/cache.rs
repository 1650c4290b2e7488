//! Raw input cache
//!
//! Keeps the encoded bytes of the last loaded image so it can be written
//! back out without re-encoding the decoded pixels.

/// Encoded bytes with their content type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Vec<u8>,
    content_type: String,
}

impl EncodedImage {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Optional store for the last encoded input
#[derive(Debug, Clone, Default)]
pub struct RawCache {
    enabled: bool,
    entry: Option<EncodedImage>,
}

impl RawCache {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, entry: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn caching on or off. Turning it off drops any cached entry.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entry = None;
        }
    }

    /// Keep a private copy of `bytes` if caching is enabled
    pub fn store(&mut self, bytes: &[u8], content_type: &str) {
        if self.enabled {
            tracing::debug!("Caching {} bytes of {}", bytes.len(), content_type);
            self.entry = Some(EncodedImage::new(bytes, content_type));
        }
    }

    pub fn get(&self) -> Option<&EncodedImage> {
        self.entry.as_ref()
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.entry.as_ref().map(EncodedImage::bytes)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.entry.as_ref().map(EncodedImage::content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let mut cache = RawCache::default();
        cache.store(b"abc", "image/png");
        assert!(cache.get().is_none());
    }

    #[test]
    fn test_enabled_cache_keeps_copy() {
        let mut cache = RawCache::new(true);
        let data = vec![1u8, 2, 3];
        cache.store(&data, "image/png");
        drop(data);

        assert_eq!(cache.bytes(), Some(&[1u8, 2, 3][..]));
        assert_eq!(cache.content_type(), Some("image/png"));
    }

    #[test]
    fn test_disable_clears_entry() {
        let mut cache = RawCache::new(false);
        cache.set_enabled(true);
        cache.store(b"abc", "image/gif");
        cache.set_enabled(false);

        assert!(cache.bytes().is_none());
        assert!(cache.content_type().is_none());
        assert!(!cache.is_enabled());
    }
}
