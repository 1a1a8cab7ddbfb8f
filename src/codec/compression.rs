//! Payload compression for share links.
//!
//! Uses DEFLATE to shrink the serialized message, then base64 with the
//! URL-safe alphabet (`A-Z a-z 0-9 - _`, no padding) so the result can sit in
//! a URL fragment without percent-encoding.

use std::io::Read;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use flate2::read::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use thiserror::Error;

/// Upper bound on decompressed payloads; larger streams are rejected.
pub const MAX_DECOMPRESSED_BYTES: usize = 16 * 1024 * 1024;

const MARKER_STORED: u8 = 0;
const MARKER_DEFLATED: u8 = 1;

/// Compression errors.
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),
}

/// Compresses data using DEFLATE.
///
/// The first byte is a marker: 0 = stored as-is, 1 = deflated. Deflate output
/// is only kept when it is smaller than the input.
pub fn compress_bytes(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    if data.is_empty() {
        return Ok(vec![MARKER_STORED]);
    }

    let mut encoder = DeflateEncoder::new(data, Compression::best());
    let mut compressed = Vec::new();

    encoder
        .read_to_end(&mut compressed)
        .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;

    let (marker, body) = if compressed.len() < data.len() {
        (MARKER_DEFLATED, compressed.as_slice())
    } else {
        (MARKER_STORED, data)
    };

    let mut result = Vec::with_capacity(body.len() + 1);
    result.push(marker);
    result.extend_from_slice(body);
    Ok(result)
}

/// Decompresses data produced by [`compress_bytes`].
pub fn decompress_bytes(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let (&marker, payload) = data
        .split_first()
        .ok_or_else(|| CompressionError::DecompressionFailed("Empty data".to_string()))?;

    match marker {
        MARKER_STORED => Ok(payload.to_vec()),
        MARKER_DEFLATED => inflate(payload),
        other => Err(CompressionError::DecompressionFailed(format!(
            "Invalid marker byte: {}",
            other
        ))),
    }
}

/// Inflates a complete raw DEFLATE stream.
///
/// The stream must end exactly at the end of `payload`: truncated streams and
/// trailing bytes are both errors, so partial output never escapes.
fn inflate(payload: &[u8]) -> Result<Vec<u8>, CompressionError> {
    inflate_with_limit(payload, MAX_DECOMPRESSED_BYTES)
}

fn inflate_with_limit(payload: &[u8], limit: usize) -> Result<Vec<u8>, CompressionError> {
    let too_large = || CompressionError::DecompressionFailed(format!("Payload exceeds {} bytes", limit));

    // One byte of headroom past the limit tells "exactly at" from "over"
    let ceiling = limit.saturating_add(1);
    let mut inflater = Decompress::new(false);
    let mut out = Vec::with_capacity(payload.len().saturating_mul(4).clamp(64, ceiling));

    loop {
        if out.len() == out.capacity() {
            if out.len() >= ceiling {
                return Err(too_large());
            }
            let grow = out.len().max(64).min(ceiling - out.len());
            out.reserve_exact(grow);
        }

        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let consumed = before_in as usize;

        let status = inflater
            .decompress_vec(&payload[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() == before_in && inflater.total_out() == before_out;
                if stalled && out.len() < out.capacity() {
                    return Err(CompressionError::DecompressionFailed(
                        "Truncated stream".to_string(),
                    ));
                }
            }
        }
    }

    if out.len() > limit {
        return Err(too_large());
    }
    if (inflater.total_in() as usize) != payload.len() {
        return Err(CompressionError::DecompressionFailed(
            "Trailing bytes after stream".to_string(),
        ));
    }
    Ok(out)
}

/// Compresses text into a URL-fragment-safe token.
pub fn compress(text: &str) -> Result<String, CompressionError> {
    let bytes = compress_bytes(text.as_bytes())?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decompresses a token, reporting why it is not one [`compress`] produced.
pub fn try_decompress(token: &str) -> Result<String, CompressionError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| CompressionError::DecompressionFailed(format!("Invalid token: {}", e)))?;
    let text = decompress_bytes(&bytes)?;
    String::from_utf8(text)
        .map_err(|e| CompressionError::DecompressionFailed(format!("Invalid UTF-8: {}", e)))
}

/// Decompresses a token.
///
/// Corrupted, truncated or foreign tokens yield `None`; partial output is
/// never returned.
pub fn decompress(token: &str) -> Option<String> {
    try_decompress(token).ok()
}

/// Returns true if every character of `token` is in the transport alphabet.
pub fn is_transport_safe(token: &str) -> bool {
    token
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Returns compression ratio (compressed_size / original_size).
/// Values < 1.0 mean compression helped.
pub fn compression_ratio(original: &str, token: &str) -> f64 {
    if original.is_empty() {
        return 1.0;
    }
    token.len() as f64 / original.len() as f64
}
