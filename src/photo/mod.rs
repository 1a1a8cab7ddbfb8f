//! Photo handling for wishlink.
//!
//! This module provides:
//! - Downscale-only resizing into a bounded box (aspect ratio preserved)
//! - Single-pass JPEG re-encoding at a configured quality
//! - Self-describing data URL tokens
//! - Concurrent batch compression with per-photo failures
//! - A pluggable [`ImageBackend`] so the pipeline runs without a native host

pub mod backend;
pub mod compressor;
pub mod token;

pub use backend::{BackendError, ImageBackend, RustBackend};
pub use compressor::{
    calculate_output_dimensions, format_bytes, is_raster_media_type, jpeg_quality,
    CompressedImage, Dimensions, ImageCompressor, ImageConfig, ImageError, RawImage,
};
pub use token::{ImageToken, JPEG_MEDIA_TYPE};
