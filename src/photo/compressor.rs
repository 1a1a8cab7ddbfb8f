//! Photo downscaling and re-encoding.
//!
//! Each photo goes through one pass:
//! 1. Reject non-raster media types and oversized uploads (before decoding)
//! 2. Decode
//! 3. Shrink to fit the configured box, keeping the aspect ratio (never enlarge)
//! 4. Re-encode as JPEG at the configured quality
//! 5. Wrap as a data URL token
//!
//! The byte target is advisory only. There is no quality search: a photo that
//! misses the target is still returned, flagged via `within_target`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::GenericImageView;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::backend::{BackendError, ImageBackend, RustBackend};
use super::token::{ImageToken, JPEG_MEDIA_TYPE};

/// Default maximum output width in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 800;

/// Default maximum output height in pixels.
pub const DEFAULT_MAX_HEIGHT: u32 = 800;

/// Default JPEG quality on a 0.0-1.0 scale.
pub const DEFAULT_QUALITY: f32 = 0.85;

/// Default advisory size target for one encoded photo.
pub const DEFAULT_TARGET_BYTES: usize = 200 * 1024;

/// Default hard cap on uploaded photo size, checked before decoding.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;

/// Errors that can occur while compressing one photo.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Unsupported media type '{0}': not a raster image")]
    UnsupportedFormat(String),

    #[error("Photo is {size} bytes, max {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Photo could not be decoded: {0}")]
    Decode(String),

    #[error("Photo could not be re-encoded: {0}")]
    Encode(String),

    #[error("Photo compression timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Photo compression was cancelled")]
    Cancelled,

    #[error("Photo compression worker panicked")]
    WorkerPanicked,
}

impl From<BackendError> for ImageError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Decode(msg) => ImageError::Decode(msg),
            BackendError::Encode(msg) => ImageError::Encode(msg),
        }
    }
}

/// Settings for photo compression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum output width in pixels.
    pub max_width: u32,

    /// Maximum output height in pixels.
    pub max_height: u32,

    /// JPEG quality, 0.0-1.0.
    pub quality: f32,

    /// Advisory encoded size target in bytes.
    pub target_bytes: usize,

    /// Uploads above this size are rejected without being decoded.
    pub max_input_bytes: usize,

    /// Per-photo time limit in milliseconds (none by default).
    ///
    /// Each timed photo runs on its own thread. On timeout the caller gets
    /// [`ImageError::TimedOut`] at once, but the worker only stops at the next
    /// stage boundary: a decode or encode already under way runs to the end
    /// and holds its memory until then.
    pub timeout_ms: Option<u64>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            target_bytes: DEFAULT_TARGET_BYTES,
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            timeout_ms: None,
        }
    }
}

impl ImageConfig {
    /// The per-photo time limit, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// A user-supplied photo before compression.
#[derive(Debug, Clone)]
pub struct RawImage {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl RawImage {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
        }
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn fits_within(&self, max_width: u32, max_height: u32) -> bool {
        self.width <= max_width && self.height <= max_height
    }
}

/// Result of compressing one photo.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// The re-encoded photo.
    pub token: ImageToken,
    /// Decoded source dimensions.
    pub source: Dimensions,
    /// Output dimensions.
    pub output: Dimensions,
    /// Uploaded size in bytes.
    pub input_bytes: usize,
    /// Encoded JPEG size in bytes (before base64).
    pub encoded_bytes: usize,
    /// Whether the encoded size met the advisory target.
    pub within_target: bool,
}

/// Compresses photos through an [`ImageBackend`].
///
/// Holds no per-call state, so one compressor can serve many photos at once.
#[derive(Clone)]
pub struct ImageCompressor {
    backend: Arc<dyn ImageBackend>,
    config: ImageConfig,
}

impl ImageCompressor {
    /// Creates a compressor backed by the `image` crate.
    pub fn new(config: ImageConfig) -> Self {
        Self::with_backend(config, Arc::new(RustBackend::new()))
    }

    /// Creates a compressor with an injected backend.
    pub fn with_backend(config: ImageConfig, backend: Arc<dyn ImageBackend>) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ImageConfig {
        &self.config
    }

    /// Compresses one photo in a single pass.
    pub fn compress(&self, bytes: &[u8], media_type: &str) -> Result<CompressedImage, ImageError> {
        compress_with(self.backend.as_ref(), &self.config, bytes, media_type, &AtomicBool::new(false))
    }

    /// Compresses one photo on a worker thread, giving up after `timeout`.
    ///
    /// A timed-out worker is told to stop and detached. It checks between
    /// decode, resize and encode, so it may finish its current stage first;
    /// its result is discarded.
    pub fn compress_with_timeout(
        &self,
        bytes: &[u8],
        media_type: &str,
        timeout: Duration,
    ) -> Result<CompressedImage, ImageError> {
        // Cheap rejections happen here so oversized input is never copied
        check_input(&self.config, bytes.len(), media_type)?;

        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        let config = self.config.clone();
        let bytes = bytes.to_vec();
        let media_type = media_type.to_string();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);

        thread::spawn(move || {
            let result = compress_with(backend.as_ref(), &config, &bytes, &media_type, &worker_cancelled);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::Relaxed);
                warn!(?timeout, "photo compression timed out");
                Err(ImageError::TimedOut(timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(ImageError::WorkerPanicked),
        }
    }

    /// Compresses one photo, applying the configured time limit if any.
    pub fn compress_raw(&self, raw: &RawImage) -> Result<CompressedImage, ImageError> {
        match self.config.timeout() {
            Some(timeout) => self.compress_with_timeout(&raw.bytes, &raw.media_type, timeout),
            None => self.compress(&raw.bytes, &raw.media_type),
        }
    }

    /// Compresses every photo concurrently and waits for all of them.
    ///
    /// Results come back in input order, one per photo; a failure affects
    /// only its own slot.
    pub fn compress_batch(&self, images: &[RawImage]) -> Vec<Result<CompressedImage, ImageError>> {
        thread::scope(|scope| {
            let handles: Vec<_> = images
                .iter()
                .map(|raw| scope.spawn(move || self.compress_raw(raw)))
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or(Err(ImageError::WorkerPanicked)))
                .collect()
        })
    }
}

impl Default for ImageCompressor {
    fn default() -> Self {
        Self::new(ImageConfig::default())
    }
}

fn check_input(config: &ImageConfig, size: usize, media_type: &str) -> Result<(), ImageError> {
    if !is_raster_media_type(media_type) {
        return Err(ImageError::UnsupportedFormat(media_type.to_string()));
    }
    if size > config.max_input_bytes {
        return Err(ImageError::TooLarge {
            size,
            max: config.max_input_bytes,
        });
    }
    Ok(())
}

fn compress_with(
    backend: &dyn ImageBackend,
    config: &ImageConfig,
    bytes: &[u8],
    media_type: &str,
    cancelled: &AtomicBool,
) -> Result<CompressedImage, ImageError> {
    let checkpoint = || {
        if cancelled.load(Ordering::Relaxed) {
            Err(ImageError::Cancelled)
        } else {
            Ok(())
        }
    };

    check_input(config, bytes.len(), media_type)?;

    let decoded = backend.decode(bytes)?;
    checkpoint()?;
    let (width, height) = decoded.dimensions();
    let source = Dimensions::new(width, height);
    let output = calculate_output_dimensions(source, config.max_width, config.max_height);

    let resized;
    let frame = if output == source {
        &decoded
    } else {
        resized = backend.resize(&decoded, output.width, output.height);
        &resized
    };
    checkpoint()?;

    let encoded = backend.encode_jpeg(frame, jpeg_quality(config.quality))?;
    let within_target = encoded.len() <= config.target_bytes;
    if !within_target {
        warn!(
            encoded_bytes = encoded.len(),
            target_bytes = config.target_bytes,
            "photo exceeds size target"
        );
    }

    debug!(
        source_width = source.width,
        source_height = source.height,
        width = output.width,
        height = output.height,
        input_bytes = bytes.len(),
        encoded_bytes = encoded.len(),
        "photo compressed"
    );

    Ok(CompressedImage {
        token: ImageToken::from_encoded(JPEG_MEDIA_TYPE, &encoded),
        source,
        output,
        input_bytes: bytes.len(),
        encoded_bytes: encoded.len(),
        within_target,
    })
}

/// Returns true for `image/*` media types that describe pixel data.
///
/// Parameters (`image/png; foo=bar`) are ignored; SVG is vector and rejected.
pub fn is_raster_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.strip_prefix("image/") {
        Some(subtype) => !subtype.is_empty() && subtype != "svg+xml",
        None => false,
    }
}

/// Computes the largest size that fits in `max_width` x `max_height` without
/// enlarging the source or changing its aspect ratio.
///
/// Sources that already fit are returned unchanged. Results are at least 1x1.
pub fn calculate_output_dimensions(source: Dimensions, max_width: u32, max_height: u32) -> Dimensions {
    let max_width = max_width.max(1);
    let max_height = max_height.max(1);

    if source.fits_within(max_width, max_height) {
        return source;
    }

    let scale = f64::min(
        max_width as f64 / source.width as f64,
        max_height as f64 / source.height as f64,
    );

    let width = ((source.width as f64 * scale).round() as u32).clamp(1, max_width);
    let height = ((source.height as f64 * scale).round() as u32).clamp(1, max_height);

    Dimensions::new(width, height)
}

/// Maps a 0.0-1.0 quality to the JPEG 1-100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    if quality.is_nan() {
        return (DEFAULT_QUALITY * 100.0).round() as u8;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Formats a byte count for people: `0 B`, `512 B`, `180 KB`, `2 MB`.
///
/// Rounds to the nearest whole unit; megabytes are the largest unit.
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["B", "KB", "MB"];

    let mut unit = 0;
    let mut scale = 1usize;
    while unit + 1 < UNITS.len() && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }
    format!("{} {}", (bytes as f64 / scale as f64).round() as u64, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([
                ((x * 17) % 256) as u8,
                ((y * 23) % 256) as u8,
                (((x + y) * 31) % 256) as u8,
            ])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn decoded_dimensions(token: &ImageToken) -> (u32, u32) {
        let jpeg = token.decode_payload().unwrap();
        image::load_from_memory(&jpeg).unwrap().dimensions()
    }

    /// Counts decodes so tests can prove when decoding is skipped.
    #[derive(Default)]
    struct CountingBackend {
        decodes: AtomicUsize,
    }

    impl ImageBackend for CountingBackend {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            RustBackend.decode(bytes)
        }

        fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
            RustBackend.resize(image, width, height)
        }

        fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
            RustBackend.encode_jpeg(image, quality)
        }
    }

    /// Never finishes decoding in a reasonable time. Counts encodes.
    #[derive(Default)]
    struct SlowBackend {
        encodes: AtomicUsize,
    }

    impl ImageBackend for SlowBackend {
        fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
            thread::sleep(Duration::from_millis(500));
            RustBackend.decode(bytes)
        }

        fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
            RustBackend.resize(image, width, height)
        }

        fn encode_jpeg(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
            self.encodes.fetch_add(1, Ordering::SeqCst);
            RustBackend.encode_jpeg(image, quality)
        }
    }

    #[test]
    fn test_dimensions_fit_unchanged() {
        let source = Dimensions::new(640, 480);
        assert_eq!(calculate_output_dimensions(source, 800, 800), source);

        let exact = Dimensions::new(800, 800);
        assert_eq!(calculate_output_dimensions(exact, 800, 800), exact);
    }

    #[test]
    fn test_dimensions_landscape() {
        let out = calculate_output_dimensions(Dimensions::new(1600, 1200), 800, 800);
        assert_eq!(out, Dimensions::new(800, 600));
    }

    #[test]
    fn test_dimensions_portrait() {
        let out = calculate_output_dimensions(Dimensions::new(1000, 4000), 800, 800);
        assert_eq!(out, Dimensions::new(200, 800));
    }

    #[test]
    fn test_dimensions_wide_but_within_width() {
        // Landscape source whose height is the only dimension over the box
        let out = calculate_output_dimensions(Dimensions::new(900, 850), 1000, 800);
        assert_eq!(out.height, 800);
        assert!(out.width <= 900);
    }

    #[test]
    fn test_dimensions_never_exceed_bounds() {
        let sizes = [(1, 5000), (5000, 1), (801, 801), (3, 2), (12345, 6789), (799, 2400)];
        for (w, h) in sizes {
            let source = Dimensions::new(w, h);
            let out = calculate_output_dimensions(source, 800, 800);
            assert!(out.width <= w && out.width <= 800, "{:?} -> {:?}", source, out);
            assert!(out.height <= h && out.height <= 800, "{:?} -> {:?}", source, out);
            assert!(out.width >= 1 && out.height >= 1);
        }
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(0.85), 85);
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(7.0), 100);
        assert_eq!(jpeg_quality(f32::NAN), 85);
    }

    #[test]
    fn test_raster_media_types() {
        assert!(is_raster_media_type("image/jpeg"));
        assert!(is_raster_media_type("image/PNG"));
        assert!(is_raster_media_type("image/webp; q=1"));
        assert!(!is_raster_media_type("image/svg+xml"));
        assert!(!is_raster_media_type("image/"));
        assert!(!is_raster_media_type("text/plain"));
        assert!(!is_raster_media_type("application/pdf"));
    }

    #[test]
    fn test_compress_downscales() {
        let compressor = ImageCompressor::default();
        let result = compressor.compress(&png_bytes(1000, 500), "image/png").unwrap();

        assert_eq!(result.source, Dimensions::new(1000, 500));
        assert_eq!(result.output, Dimensions::new(800, 400));
        assert_eq!(result.token.media_type(), Some("image/jpeg"));
        assert_eq!(decoded_dimensions(&result.token), (800, 400));
    }

    #[test]
    fn test_compress_never_upscales() {
        let compressor = ImageCompressor::default();
        let result = compressor.compress(&png_bytes(120, 60), "image/png").unwrap();

        assert_eq!(result.output, Dimensions::new(120, 60));
        assert_eq!(decoded_dimensions(&result.token), (120, 60));
        assert!(result.within_target);
    }

    #[test]
    fn test_compress_respects_custom_box() {
        let config = ImageConfig {
            max_width: 64,
            max_height: 64,
            ..Default::default()
        };
        let result = ImageCompressor::new(config)
            .compress(&png_bytes(256, 128), "image/png")
            .unwrap();
        assert_eq!(result.output, Dimensions::new(64, 32));
    }

    #[test]
    fn test_unsupported_format() {
        let result = ImageCompressor::default().compress(&png_bytes(10, 10), "text/plain");
        assert!(matches!(result, Err(ImageError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_corrupt_bytes_fail_decode() {
        let result = ImageCompressor::default().compress(b"\x89PNG garbage", "image/png");
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_too_large_checked_before_decode() {
        let backend = Arc::new(CountingBackend::default());
        let config = ImageConfig {
            max_input_bytes: 16,
            ..Default::default()
        };
        let compressor = ImageCompressor::with_backend(config, backend.clone());

        // Not even an image: the size check must fire first
        let result = compressor.compress(&[0u8; 17], "image/jpeg");
        assert!(matches!(result, Err(ImageError::TooLarge { size: 17, max: 16 })));
        assert_eq!(backend.decodes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_low_target_is_advisory() {
        let config = ImageConfig {
            target_bytes: 10,
            ..Default::default()
        };
        let result = ImageCompressor::new(config)
            .compress(&png_bytes(64, 64), "image/png")
            .unwrap();
        assert!(!result.within_target);
        assert!(result.encoded_bytes > 10);
    }

    #[test]
    fn test_timeout() {
        let config = ImageConfig {
            timeout_ms: Some(20),
            ..Default::default()
        };
        let compressor = ImageCompressor::with_backend(config, Arc::new(SlowBackend::default()));
        let result = compressor.compress_raw(&RawImage::new(png_bytes(8, 8), "image/png"));
        assert!(matches!(result, Err(ImageError::TimedOut(_))));
    }

    #[test]
    fn test_timed_out_worker_stops_before_encoding() {
        let backend = Arc::new(SlowBackend::default());
        let compressor = ImageCompressor::with_backend(ImageConfig::default(), backend.clone());
        let result =
            compressor.compress_with_timeout(&png_bytes(8, 8), "image/png", Duration::from_millis(20));
        assert!(matches!(result, Err(ImageError::TimedOut(_))));

        // Let the detached worker finish its decode
        thread::sleep(Duration::from_millis(900));
        assert_eq!(backend.encodes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unset_cancel_flag_runs_every_stage() {
        let backend = SlowBackend::default();
        let config = ImageConfig::default();
        let result = compress_with(&backend, &config, &png_bytes(8, 8), "image/png", &AtomicBool::new(false));
        assert!(result.is_ok());
        assert_eq!(backend.encodes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_cancel_flag_stops_after_decode() {
        let backend = SlowBackend::default();
        let config = ImageConfig::default();
        let result = compress_with(&backend, &config, &png_bytes(8, 8), "image/png", &AtomicBool::new(true));
        assert!(matches!(result, Err(ImageError::Cancelled)));
        assert_eq!(backend.encodes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_timeout_not_hit() {
        let compressor = ImageCompressor::default();
        let result =
            compressor.compress_with_timeout(&png_bytes(8, 8), "image/png", Duration::from_secs(30));
        assert!(result.is_ok());
    }

    #[test]
    fn test_batch_keeps_order_and_isolates_failures() {
        let compressor = ImageCompressor::default();
        let images = vec![
            RawImage::new(png_bytes(1000, 100), "image/png"),
            RawImage::new(b"broken".to_vec(), "image/png"),
            RawImage::new(png_bytes(50, 40), "image/png"),
            RawImage::new(png_bytes(10, 10), "application/zip"),
        ];

        let results = compressor.compress_batch(&images);
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().output, Dimensions::new(800, 80));
        assert!(matches!(results[1], Err(ImageError::Decode(_))));
        assert_eq!(results[2].as_ref().unwrap().output, Dimensions::new(50, 40));
        assert!(matches!(results[3], Err(ImageError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_batch_empty() {
        assert!(ImageCompressor::default().compress_batch(&[]).is_empty());
    }

    #[test]
    fn test_config_from_toml_uses_defaults() {
        let config: ImageConfig = toml::from_str("max_width = 400\ntimeout_ms = 1500").unwrap();
        assert_eq!(config.max_width, 400);
        assert_eq!(config.max_height, DEFAULT_MAX_HEIGHT);
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "2 KB");
        assert_eq!(format_bytes(180 * 1024), "180 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
        assert_eq!(format_bytes(5 * 1024 * 1024 * 1024), "5120 MB");
    }
}
