//! Image normalization before OCR
//!
//! Decodes uploaded or captured bytes, scales oversized images down so that
//! neither side exceeds the configured maximum, and re-encodes as JPEG.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use tracing::debug;

use crate::config::PreprocessConfig;
use crate::error::StageError;

/// Re-encoded image ready for the OCR engine
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// JPEG-encoded image data
    pub bytes: Vec<u8>,
    /// Width after normalization
    pub width: u32,
    /// Height after normalization
    pub height: u32,
    /// Whether the image was scaled down
    pub resized: bool,
}

/// Dimensions that fit `width`x`height` inside `max_width`x`max_height`
/// while keeping the aspect ratio. `None` when the image already fits.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width <= max_width && height <= max_height {
        return None;
    }

    let ratio = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = ((width as f64 * ratio).round() as u32).clamp(1, max_width.max(1));
    let new_height = ((height as f64 * ratio).round() as u32).clamp(1, max_height.max(1));
    Some((new_width, new_height))
}

/// Decode, bound, and re-encode an image
pub fn optimize(raw: &[u8], config: &PreprocessConfig) -> Result<NormalizedImage, StageError> {
    config.validate()?;
    let image = image::load_from_memory(raw).map_err(|e| StageError::Decode(e.to_string()))?;
    let (width, height) = image.dimensions();

    let (image, resized) = match fit_dimensions(width, height, config.max_dimension, config.max_dimension) {
        Some((new_width, new_height)) => {
            debug!("Resizing {}x{} -> {}x{}", width, height, new_width, new_height);
            (image.resize_exact(new_width, new_height, FilterType::Lanczos3), true)
        }
        None => (image, false),
    };

    let rgb = image.to_rgb8();
    let bytes = encode_jpeg(&rgb, config.jpeg_quality)?;

    Ok(NormalizedImage {
        bytes,
        width: rgb.width(),
        height: rgb.height(),
        resized,
    })
}

/// Encode an RGB buffer as JPEG
pub fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, StageError> {
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder
        .encode_image(rgb)
        .map_err(|e| StageError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Decode an image and keep only its RGB channels
pub fn decode_rgb(raw: &[u8]) -> Result<RgbImage, StageError> {
    image::load_from_memory(raw)
        .map(|img: DynamicImage| img.to_rgb8())
        .map_err(|e| StageError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 128]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_fit_dimensions_noop() {
        assert_eq!(fit_dimensions(2000, 2000, 2000, 2000), None);
        assert_eq!(fit_dimensions(100, 1999, 2000, 2000), None);
    }

    #[test]
    fn test_fit_dimensions_scales_longest_side() {
        assert_eq!(fit_dimensions(4000, 1000, 2000, 2000), Some((2000, 500)));
        assert_eq!(fit_dimensions(1000, 4000, 2000, 2000), Some((500, 2000)));
        // 3000 * (2/3) = 2000, 1234 * (2/3) = 822.67
        assert_eq!(fit_dimensions(3000, 1234, 2000, 2000), Some((2000, 823)));
    }

    #[test]
    fn test_fit_dimensions_never_zero() {
        assert_eq!(fit_dimensions(10_000, 1, 2000, 2000), Some((2000, 1)));
    }

    #[test]
    fn test_fit_dimensions_zero_bound_does_not_panic() {
        assert_eq!(fit_dimensions(10, 10, 0, 0), Some((1, 1)));
    }

    #[test]
    fn test_zero_max_dimension_is_a_configuration_error() {
        let config = PreprocessConfig {
            max_dimension: 0,
            jpeg_quality: 90,
        };
        let err = optimize(&png_bytes(10, 10), &config).unwrap_err();
        assert!(matches!(err, StageError::InvalidSetting(_)));
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let config = PreprocessConfig::default();
        let result = optimize(&png_bytes(100, 100), &config).unwrap();

        assert!(!result.resized);
        assert_eq!((result.width, result.height), (100, 100));

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (100, 100));
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_large_image_is_bounded_and_keeps_ratio() {
        let config = PreprocessConfig::default();
        let (width, height) = (3001u32, 1200u32);
        let result = optimize(&png_bytes(width, height), &config).unwrap();

        assert!(result.resized);
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        let (w, h) = decoded.dimensions();
        assert!(w <= 2000 && h <= 2000);
        assert_eq!(w, 2000);

        // Aspect ratio within one pixel of rounding
        let expected_h = w as f64 * height as f64 / width as f64;
        assert!((h as f64 - expected_h).abs() <= 1.0);
    }

    #[test]
    fn test_custom_max_dimension() {
        let config = PreprocessConfig {
            max_dimension: 50,
            jpeg_quality: 75,
        };
        let result = optimize(&png_bytes(100, 40), &config).unwrap();
        assert_eq!((result.width, result.height), (50, 20));
    }

    #[test]
    fn test_corrupted_bytes_fail_to_decode() {
        let config = PreprocessConfig::default();
        let err = optimize(b"definitely not an image", &config).unwrap_err();
        assert!(matches!(err, StageError::Decode(_)));
    }
}
