//! Image decode/resize/encode capability.
//!
//! The compressor never touches an image library directly; it goes through
//! [`ImageBackend`], so tests can substitute a backend and hosts without a
//! native decoder can bring their own.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;

/// Errors raised by an image backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),
}

/// Pixel access and lossy re-encoding.
pub trait ImageBackend: Send + Sync {
    /// Decodes raster bytes, sniffing the format from the content.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resamples to exactly `width` x `height`.
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    /// Encodes a single baseline JPEG frame at `quality` (1-100).
    fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError>;
}

/// Production backend built on the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
        // JPEG has no alpha channel
        let rgb = image.to_rgb8();
        let mut bytes = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality);
            encoder
                .encode_image(&rgb)
                .map_err(|e| BackendError::Encode(e.to_string()))?;
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, ImageBuffer, Rgba};

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let img = ImageBuffer::from_fn(20, 10, |x, _| Rgba([x as u8 * 10, 40, 90, 128]));
        let backend = RustBackend::new();

        let jpeg = backend
            .encode_jpeg(&DynamicImage::ImageRgba8(img), 85)
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let decoded = backend.decode(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = RustBackend::new().decode(b"definitely not an image");
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }

    #[test]
    fn test_resize_exact() {
        let img = DynamicImage::new_rgb8(64, 32);
        let resized = RustBackend::new().resize(&img, 16, 8);
        assert_eq!(resized.dimensions(), (16, 8));
    }
}
