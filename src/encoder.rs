//! Share link encoding.
//!
//! This module orchestrates the encoding process:
//! 1. Compress raw photos concurrently, waiting for all of them
//! 2. Attach the photos that succeeded, in upload order
//! 3. Check the producer rules
//! 4. Serialize to the structured form (JSON)
//! 5. Compress into the URL-safe alphabet
//! 6. Attach the `#w=` marker and measure against the budget
//!
//! A photo that fails to compress is reported and skipped; it never aborts
//! the encode. Going over the link budget is reported, never refused.

use thiserror::Error;
use tracing::{debug, warn};

use crate::budget::BudgetReport;
use crate::codec::{compress, pack, state, CompressionError};
use crate::message::{Message, ValidationError};
use crate::photo::{CompressedImage, ImageCompressor, ImageError, RawImage};
use crate::{LINK_BUDGET_CHARS, MAX_PHOTOS};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://wish.example/";

/// Errors that can occur during encoding.
#[derive(Error, Debug)]
pub enum EncoderError {
    #[error("Invalid message: {0}")]
    Validation(#[from] ValidationError),

    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),
}

/// A photo that could not be compressed and was left out.
#[derive(Debug)]
pub struct PhotoFailure {
    /// Position of the photo in the upload batch.
    pub index: usize,
    pub error: ImageError,
}

/// Result of encoding a message.
#[derive(Debug)]
pub struct EncodedShare {
    /// The share link - this is what gets sent.
    pub url: String,
    /// The compressed payload after the marker.
    pub payload: String,
    /// Length advice for the link.
    pub budget: BudgetReport,
    /// The message that was encoded, with its photos attached.
    pub message: Message,
    /// Compression details for each photo that made it in, in order.
    pub photos: Vec<CompressedImage>,
    /// Photos that were skipped.
    pub photo_failures: Vec<PhotoFailure>,
}

/// Configuration for the encoder.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Origin and path the payload is appended to.
    pub base_url: String,
    /// Recommended maximum link length.
    pub budget_chars: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            budget_chars: LINK_BUDGET_CHARS,
        }
    }
}

/// Encodes a message into a share link using the default configuration.
pub fn encode(message: &Message) -> Result<EncodedShare, EncoderError> {
    encode_with_config(message, &EncoderConfig::default())
}

/// Encodes a message whose photos are already compressed.
pub fn encode_with_config(
    message: &Message,
    config: &EncoderConfig,
) -> Result<EncodedShare, EncoderError> {
    encode_prepared(message.clone(), Vec::new(), Vec::new(), config)
}

/// Compresses `photos`, appends them to `message` and encodes the result.
///
/// The photo cap applies to the whole batch up front: if `message` already
/// holds photos and the batch would push it past [`MAX_PHOTOS`], nothing is
/// compressed and the encode is refused.
pub fn encode_with_photos(
    message: &Message,
    photos: &[RawImage],
    compressor: &ImageCompressor,
    config: &EncoderConfig,
) -> Result<EncodedShare, EncoderError> {
    if photos.len() > message.remaining_photo_slots() {
        return Err(ValidationError::TooManyPhotos { max: MAX_PHOTOS }.into());
    }

    debug!(count = photos.len(), "compressing photos");
    let results = compressor.compress_batch(photos);

    let mut message = message.clone();
    let mut compressed = Vec::with_capacity(results.len());
    let mut failures = Vec::new();

    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(photo) => {
                message.add_photo(photo.token.clone())?;
                compressed.push(photo);
            }
            Err(error) => {
                warn!(index, %error, "skipping photo");
                failures.push(PhotoFailure { index, error });
            }
        }
    }

    encode_prepared(message, compressed, failures, config)
}

fn encode_prepared(
    message: Message,
    photos: Vec<CompressedImage>,
    photo_failures: Vec<PhotoFailure>,
    config: &EncoderConfig,
) -> Result<EncodedShare, EncoderError> {
    message.validate()?;

    let json = state::to_json(&message);
    let payload = compress(&json)?;
    let url = pack(&config.base_url, &payload);
    let budget = BudgetReport::measure(&url, &payload, config.budget_chars);

    debug!(
        json_bytes = json.len(),
        payload_chars = budget.payload_chars,
        link_chars = budget.link_chars,
        photos = message.photos().len(),
        "message encoded"
    );
    if let Some(warning) = budget.warning() {
        warn!("{}", warning);
    }

    Ok(EncodedShare {
        url,
        payload,
        budget,
        message,
        photos,
        photo_failures,
    })
}
