//! Supported content types

use image::ImageFormat as ImgFormat;

/// Image formats the built-in decoders handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Priority order of the built-in decoders
    pub const ALL: [ImageFormat; 4] = [Self::Jpeg, Self::Png, Self::Gif, Self::Bmp];

    /// Canonical content type
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/x-ms-bmp",
        }
    }

    /// Match a content type, ignoring ASCII case
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.trim();
        if content_type.eq_ignore_ascii_case("image/bmp") {
            return Some(Self::Bmp);
        }
        Self::ALL
            .into_iter()
            .find(|f| f.content_type().eq_ignore_ascii_case(content_type))
    }

    /// Convert to image crate format
    pub(crate) fn to_image_format(self) -> ImgFormat {
        match self {
            Self::Jpeg => ImgFormat::Jpeg,
            Self::Png => ImgFormat::Png,
            Self::Gif => ImgFormat::Gif,
            Self::Bmp => ImgFormat::Bmp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_case_insensitive() {
        assert_eq!(ImageFormat::from_content_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_content_type("image/Jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_content_type("image/bmp"), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::from_content_type("image/webp"), None);
    }

    #[test]
    fn test_content_type_roundtrip() {
        for format in ImageFormat::ALL {
            assert_eq!(ImageFormat::from_content_type(format.content_type()), Some(format));
        }
    }
}
