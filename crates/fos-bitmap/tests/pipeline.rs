//! Pipeline tests - encoded bytes to pixels on a surface
//!
//! Fixtures are encoded at test time with the image and png crates.

use std::io::Cursor;

use fos_bitmap::*;
use image::{DynamicImage, ImageBuffer, Rgb, Rgba};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn encode(img: &DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

fn rgb_fixture(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8])
    }))
}

fn rgba_fixture(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x * 9) as u8, (y * 5) as u8, 200, (x * 16 + y) as u8])
    }))
}

fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)));
    encode(&img, image::ImageFormat::Png)
}

/// Rows of pseudo-random RGB so deflate cannot shrink them much
fn noisy_png(width: u32, height: u32, depth: png::BitDepth) -> Vec<u8> {
    let bytes_per_sample = if depth == png::BitDepth::Sixteen { 2 } else { 1 };
    let mut seed: u32 = 0x1234_5678;
    let data: Vec<u8> = (0..width * height * 3 * bytes_per_sample)
        .map(|_| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            // keep clear of pure black
            (seed >> 24) as u8 | 0x10
        })
        .collect();

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(depth);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&data).unwrap();
        writer.finish().unwrap();
    }
    out
}

/// Header claiming `width` x `height` RGBA16 followed by an empty IDAT
fn forged_png(width: u32, height: u32) -> Vec<u8> {
    // zlib stream holding a single empty stored block
    const EMPTY_ZLIB: [u8; 8] = [0x78, 0x9C, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01];

    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Sixteen);
        let mut writer = encoder.write_header().unwrap();
        writer.write_chunk(png::chunk::IDAT, &EMPTY_ZLIB).unwrap();
        // dropping the writer appends IEND
    }
    out
}

/// Decode `bytes` whole and cut in half, then check the recovered rows
fn assert_truncation_recovers_rows(bytes: &[u8], width: u32, height: u32) {
    let registry = DecoderRegistry::default();
    let decoder = DefensiveDecoder::new(&registry);
    let reference = decoder.decode(bytes, "image/png").unwrap().unwrap();

    let truncated = &bytes[..bytes.len() / 2];
    let partial = decoder.decode(truncated, "image/png").unwrap().unwrap();
    assert_eq!((partial.width(), partial.height()), (width, height));

    let boundary = (0..height)
        .find(|&y| partial.row(y).unwrap().iter().all(|&p| p == TRANSPARENT))
        .unwrap_or(height);
    assert!(boundary > 0, "no rows recovered");
    assert!(boundary < height, "truncation not detected");

    for y in 0..boundary {
        assert_eq!(partial.row(y), reference.row(y), "row {y}");
    }
    for y in boundary..height {
        assert!(partial.row(y).unwrap().iter().all(|&p| p == TRANSPARENT), "row {y}");
    }
}

// ============================================================================
// CAPABILITY
// ============================================================================

#[test]
fn test_can_render_supported_types() {
    let renderer = BitmapRenderer::new();
    for format in ImageFormat::ALL {
        assert!(renderer.can_render(format.content_type()));
        assert!(renderer.can_render(&format.content_type().to_uppercase()));
    }
    assert!(!renderer.can_render("image/tiff"));
    assert!(!renderer.can_render("application/octet-stream"));
}

// ============================================================================
// WELL-FORMED DECODING
// ============================================================================

#[test]
fn test_decode_png_with_alpha() {
    init_tracing();
    let source = rgba_fixture(12, 9);
    let bytes = encode(&source, image::ImageFormat::Png);

    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&bytes, "image/png").unwrap();
    let bmp = renderer.image().unwrap();

    assert_eq!((bmp.width(), bmp.height()), (12, 9));
    let rgba = source.to_rgba8();
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        assert_eq!(bmp.get_pixel(x, y), Some(pack_argb(a, r, g, b)), "pixel ({x}, {y})");
    }
}

#[test]
fn test_decode_bmp_is_opaque_and_exact() {
    let source = rgb_fixture(10, 7);
    let bytes = encode(&source, image::ImageFormat::Bmp);

    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&bytes, "image/x-ms-bmp").unwrap();
    let bmp = renderer.image().unwrap();

    let rgb = source.to_rgb8();
    for (x, y, px) in rgb.enumerate_pixels() {
        let [r, g, b] = px.0;
        assert_eq!(bmp.get_pixel(x, y), Some(pack_argb(0xFF, r, g, b)));
    }
}

#[test]
fn test_decode_jpeg_dimensions_and_alpha() {
    let bytes = encode(&rgb_fixture(33, 17), image::ImageFormat::Jpeg);

    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&bytes, "image/jpeg").unwrap();
    let bmp = renderer.image().unwrap();

    assert_eq!((bmp.width(), bmp.height()), (33, 17));
    assert!(bmp.pixels().iter().all(|&p| unpack_argb(p)[0] == 0xFF));
}

#[test]
fn test_decode_gif_dimensions() {
    let bytes = encode(&rgba_fixture(20, 4), image::ImageFormat::Gif);

    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&bytes, "image/gif").unwrap();
    assert_eq!(renderer.native_bounds(), Ok(Rect::new(0.0, 0.0, 20.0, 4.0)));
}

#[test]
fn test_load_from_reader() {
    let bytes = solid_png(3, 3, [1, 2, 3]);
    let mut renderer = BitmapRenderer::new();
    renderer.load_image_from_reader(Cursor::new(bytes), "image/png").unwrap();
    assert_eq!(renderer.image().unwrap().pixels(), &[0xFF01_0203; 9]);
}

// ============================================================================
// MALFORMED INPUT
// ============================================================================

#[test]
fn test_truncated_png_keeps_decoded_rows() {
    init_tracing();
    let bytes = noisy_png(64, 64, png::BitDepth::Eight);
    assert_truncation_recovers_rows(&bytes, 64, 64);
}

#[test]
fn test_truncated_16bit_png_keeps_decoded_rows() {
    init_tracing();
    let bytes = noisy_png(32, 32, png::BitDepth::Sixteen);
    assert_truncation_recovers_rows(&bytes, 32, 32);
}

#[test]
fn test_forged_huge_header_is_refused() {
    let bytes = forged_png(60_000, 60_000);
    assert!(bytes.len() < 100);

    let mut renderer = BitmapRenderer::new();
    let err = renderer.load_image(&bytes, "image/png").unwrap_err();
    assert!(matches!(err.cause(), Some(CodecError::LimitExceeded(_))), "{err}");
    assert!(renderer.image().is_none());
}

#[test]
fn test_garbage_with_unsupported_type_is_ignored() {
    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&solid_png(2, 2, [9, 9, 9]), "image/png").unwrap();

    renderer.load_image(b"\x00\x01garbage\xff", "image/x-wmf").unwrap();
    assert!(renderer.image().is_none());
}

#[test]
fn test_garbage_with_supported_type_fails() {
    for format in ImageFormat::ALL {
        let mut renderer = BitmapRenderer::new();
        let err = renderer
            .load_image(b"definitely not an image", format.content_type())
            .unwrap_err();
        assert!(matches!(err, DecodeError::Failed { .. }), "{format:?}: {err}");
        assert!(err.cause().is_some());
    }
}

#[test]
fn test_failed_load_keeps_previous_image() {
    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&solid_png(4, 4, [0, 0, 255]), "image/png").unwrap();
    assert!(renderer.load_image(b"junk", "image/png").is_err());
    assert_eq!(renderer.bounds(), Rect::new(0.0, 0.0, 4.0, 4.0));
}

#[test]
fn test_limits_reject_large_images() {
    let mut renderer = BitmapRenderer::with_config(RendererConfig {
        limits: DecodeLimits {
            max_width: Some(10),
            ..DecodeLimits::none()
        },
        ..RendererConfig::default()
    });

    let err = renderer.load_image(&solid_png(11, 2, [1, 1, 1]), "image/png").unwrap_err();
    assert!(matches!(err.cause(), Some(CodecError::LimitExceeded(_))), "{err}");
}

// ============================================================================
// TRANSFORMS
// ============================================================================

#[test]
fn test_scaled_image() {
    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&encode(&rgb_fixture(16, 8), image::ImageFormat::Png), "image/png").unwrap();
    let original = renderer.image().unwrap().clone();

    let same = renderer.scaled_image(16.0, 8.0).unwrap();
    assert!(same.shares_storage(&original));

    let doubled = renderer.scaled_image(32.0, 16.0).unwrap();
    assert_eq!((doubled.width(), doubled.height()), (32, 16));
    assert!(!doubled.shares_storage(&original));
}

#[test]
fn test_set_alpha_halves_alpha_only() {
    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&solid_png(5, 5, [10, 20, 30]), "image/png").unwrap();

    renderer.set_alpha(0.0);
    assert!(renderer.image().unwrap().pixels().iter().all(|&p| p == 0xFF0A_141E));

    renderer.set_alpha(0.5);
    assert!(renderer.image().unwrap().pixels().iter().all(|&p| p == 0x7F0A_141E));
}

// ============================================================================
// DRAWING
// ============================================================================

#[test]
fn test_draw_without_image() {
    let renderer = BitmapRenderer::new();
    let mut surface = PixmapSurface::new(10, 10).unwrap();
    assert!(!renderer.draw_image(&mut surface, &Rect::new(0.0, 0.0, 10.0, 10.0)));
    assert!(surface.to_bitmap().pixels().iter().all(|&p| p == TRANSPARENT));
}

#[test]
fn test_draw_clipped_crops_left_edge() {
    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&solid_png(100, 100, [255, 0, 0]), "image/png").unwrap();
    let anchor = Rect::new(10.0, 10.0, 50.0, 50.0);
    let clip = ClipInsets::new(10_000, 0, 0, 0);

    let mut clipped = PixmapSurface::new(80, 80).unwrap();
    assert!(renderer.draw_image_clipped(&mut clipped, &anchor, Some(&clip)));
    let out = clipped.to_bitmap();
    assert_eq!(out.get_pixel(6, 30), Some(TRANSPARENT));
    assert_eq!(out.get_pixel(30, 30), Some(0xFFFF_0000));
    assert_eq!(out.get_pixel(59, 30), Some(0xFFFF_0000));
    assert_eq!(out.get_pixel(61, 30), Some(TRANSPARENT));
    assert_eq!(clipped.clip_region(), ClipRegion::Unbounded);

    // same transform without narrowing the clip lets the trimmed strip show
    let mut unclipped = PixmapSurface::new(80, 80).unwrap();
    let transform = clip_transform(100, 100, &anchor, &clip);
    unclipped.draw_transformed(renderer.image().unwrap(), transform);
    assert_eq!(unclipped.to_bitmap().get_pixel(6, 30), Some(0xFFFF_0000));
}

#[test]
fn test_draw_restores_existing_clip() {
    let mut renderer = BitmapRenderer::new();
    renderer.load_image(&solid_png(4, 4, [0, 255, 0]), "image/png").unwrap();

    let mut surface = PixmapSurface::new(20, 20).unwrap();
    let outer = ClipRegion::Rect(Rect::new(0.0, 0.0, 15.0, 15.0));
    surface.set_clip_region(outer);

    renderer.draw_image_clipped(&mut surface, &Rect::new(5.0, 5.0, 8.0, 8.0), Some(&ClipInsets::NONE));
    assert_eq!(surface.clip_region(), outer);
    assert_eq!(surface.to_bitmap().get_pixel(8, 8), Some(0xFF00_FF00));
}

// ============================================================================
// RAW CACHE
// ============================================================================

#[test]
fn test_cache_enable_then_disable_clears() {
    let bytes = solid_png(2, 2, [5, 5, 5]);
    let mut renderer = BitmapRenderer::new();

    renderer.load_image(&bytes, "image/png").unwrap();
    assert!(renderer.cached_image().is_none());

    renderer.set_cache_input(true);
    renderer.load_image(&bytes, "image/png").unwrap();
    assert_eq!(renderer.cached_image(), Some(bytes.as_slice()));
    assert_eq!(renderer.cached_content_type(), Some("image/png"));
    assert_eq!(renderer.cached().map(EncodedImage::bytes), Some(bytes.as_slice()));

    renderer.set_cache_input(false);
    assert!(renderer.cached_image().is_none());
    assert!(renderer.cached_content_type().is_none());
}
