//! Built-in decoders backed by the image crate

use std::io::Seek;

use image::{DynamicImage, ImageDecoder, ImageReader};

use super::{ByteStream, Decoder, NativeBuffer, PixelLayout, RasterBuffer};
use crate::config::DecodeLimits;
use crate::error::CodecError;
use crate::format::ImageFormat;

/// One image crate codec, selected by [`ImageFormat`]
#[derive(Debug, Clone, Copy)]
pub struct ImageCodec {
    format: ImageFormat,
}

impl ImageCodec {
    pub fn new(format: ImageFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Rewind and parse the header
    fn open<'s>(&self, stream: &'s mut ByteStream<'_>) -> Result<impl ImageDecoder + 's, CodecError> {
        stream.rewind()?;
        let decoder = ImageReader::with_format(stream, self.format.to_image_format()).into_decoder()?;
        Ok(decoder)
    }
}

impl Decoder for ImageCodec {
    fn name(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    fn can_decode(&self, content_type: &str) -> bool {
        ImageFormat::from_content_type(content_type) == Some(self.format)
    }

    fn dimensions(&self, stream: &mut ByteStream<'_>) -> Result<(u32, u32), CodecError> {
        Ok(self.open(stream)?.dimensions())
    }

    fn pixel_layouts(&self, stream: &mut ByteStream<'_>) -> Result<Vec<PixelLayout>, CodecError> {
        let native = PixelLayout::from_color_type(self.open(stream)?.color_type())?;
        let mut layouts = vec![native];
        // JPEG luma can always be extracted, whatever the header claims about components
        if self.format == ImageFormat::Jpeg && !native.is_gray() {
            layouts.push(PixelLayout::Gray8);
        }
        Ok(layouts)
    }

    fn decode(
        &self,
        stream: &mut ByteStream<'_>,
        layout: Option<PixelLayout>,
        limits: &DecodeLimits,
    ) -> Result<NativeBuffer, CodecError> {
        let decoder = self.open(stream)?;
        let (width, height) = decoder.dimensions();
        let native = PixelLayout::from_color_type(decoder.color_type())?;
        // the gray paths decode the native image first, so it bounds every branch
        limits.check(width, height)?;
        limits.check_memory(decoder.total_bytes())?;

        let raster = match layout {
            Some(PixelLayout::Gray8) if native != PixelLayout::Gray8 => {
                let luma = DynamicImage::from_decoder(decoder)?.into_luma8();
                RasterBuffer::from_raw(width, height, PixelLayout::Gray8, luma.into_raw())?
            }
            Some(PixelLayout::Gray16) if native != PixelLayout::Gray16 => {
                let luma = DynamicImage::from_decoder(decoder)?.into_luma16();
                let data = luma.into_raw().into_iter().flat_map(u16::to_ne_bytes).collect();
                RasterBuffer::from_raw(width, height, PixelLayout::Gray16, data)?
            }
            Some(other) if other != native => {
                return Err(CodecError::UnsupportedLayout(format!("{other:?}")));
            }
            _ => {
                let mut raster = RasterBuffer::allocate(width, height, native, limits)?;
                decoder.read_image(&mut raster.data)?;
                raster
            }
        };
        Ok(NativeBuffer::Raster(raster))
    }

    fn decode_into(&self, stream: &mut ByteStream<'_>, dest: &mut RasterBuffer) -> Result<(), CodecError> {
        let decoder = self.open(stream)?;
        let native = PixelLayout::from_color_type(decoder.color_type())?;
        if native != dest.layout {
            return Err(CodecError::UnsupportedLayout(format!(
                "{} decodes {native:?}, destination is {:?}",
                self.name(),
                dest.layout
            )));
        }
        let expected = usize::try_from(decoder.total_bytes()).unwrap_or(usize::MAX);
        if expected != dest.data.len() {
            return Err(CodecError::BufferSize {
                expected,
                actual: dest.data.len(),
            });
        }
        let result = decoder.read_image(&mut dest.data);
        // PNG stores 16-bit samples big-endian and the image crate only swaps
        // them once the whole frame has been read
        if result.is_err() && self.format == ImageFormat::Png && dest.layout.bytes_per_channel() == 2 {
            be_to_native_u16(&mut dest.data);
        }
        result?;
        Ok(())
    }
}

fn be_to_native_u16(data: &mut [u8]) {
    for sample in data.chunks_exact_mut(2) {
        let value = u16::from_be_bytes([sample[0], sample[1]]);
        sample.copy_from_slice(&value.to_ne_bytes());
    }
}
