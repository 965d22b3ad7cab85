//! Frame data structures for captured camera content

use image::{imageops::FilterType, RgbaImage};

use crate::error::StageError;
use crate::vision::preprocess::{encode_jpeg, fit_dimensions};

/// Largest still produced from a camera frame
pub const MAX_STILL_WIDTH: u32 = 1920;
pub const MAX_STILL_HEIGHT: u32 = 1080;

/// JPEG quality of captured stills
pub const STILL_JPEG_QUALITY: u8 = 95;

/// A captured frame from the camera
#[derive(Debug)]
pub struct CapturedFrame {
    /// Raw RGBA pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

impl CapturedFrame {
    /// Create a new captured frame
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self { data, width, height }
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Rasterize the frame into a JPEG still no larger than 1920x1080
    pub fn to_still(&self) -> Result<Vec<u8>, StageError> {
        let image = RgbaImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            StageError::Decode(format!(
                "Frame buffer of {} bytes does not match {}x{} RGBA",
                self.data.len(),
                self.width,
                self.height
            ))
        })?;

        let image = match fit_dimensions(self.width, self.height, MAX_STILL_WIDTH, MAX_STILL_HEIGHT) {
            Some((width, height)) => image::imageops::resize(&image, width, height, FilterType::CatmullRom),
            None => image,
        };

        // Flatten alpha; JPEG has no alpha channel
        let rgb = image::DynamicImage::ImageRgba8(image).to_rgb8();
        encode_jpeg(&rgb, STILL_JPEG_QUALITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn frame(width: u32, height: u32) -> CapturedFrame {
        CapturedFrame::new(vec![128; (width * height * 4) as usize], width, height)
    }

    #[test]
    fn test_dimensions() {
        assert_eq!(frame(4, 3).dimensions(), (4, 3));
    }

    #[test]
    fn test_still_keeps_small_frame() {
        let still = frame(640, 480).to_still().unwrap();
        let decoded = image::load_from_memory(&still).unwrap();
        assert_eq!(decoded.dimensions(), (640, 480));
    }

    #[test]
    fn test_still_fits_hd_bounds() {
        let still = frame(2560, 1440).to_still().unwrap();
        let decoded = image::load_from_memory(&still).unwrap();
        assert_eq!(decoded.dimensions(), (1920, 1080));
    }

    #[test]
    fn test_still_rejects_short_buffer() {
        let bad = CapturedFrame::new(vec![0; 10], 4, 4);
        assert!(matches!(bad.to_still(), Err(StageError::Decode(_))));
    }
}
