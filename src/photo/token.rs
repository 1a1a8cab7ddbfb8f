//! Self-describing photo tokens.
//!
//! A token is a data URL: `data:<media-type>;base64,<payload>`. It carries
//! its own format tag, so it can be rendered or decoded without the original
//! upload.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

/// Media type of every token this crate produces.
pub const JPEG_MEDIA_TYPE: &str = "image/jpeg";

/// An immutable, re-encoded photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageToken(String);

impl ImageToken {
    /// Wraps encoded image bytes of the given media type.
    pub fn from_encoded(media_type: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", media_type, BASE64.encode(bytes)))
    }

    /// Wraps JPEG bytes.
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self::from_encoded(JPEG_MEDIA_TYPE, bytes)
    }

    /// Adopts a token string as-is (used when decoding a share link).
    pub fn from_raw(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Length of the token in characters (tokens are ASCII when produced here).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Media type declared in the data URL header, if the token is one.
    pub fn media_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, _) = rest.split_once(',')?;
        header.strip_suffix(";base64")
    }

    /// Decodes the embedded image bytes.
    ///
    /// Returns `None` for tokens that are not base64 data URLs.
    pub fn decode_payload(&self) -> Option<Vec<u8>> {
        self.media_type()?;
        let (_, payload) = self.0.split_once(',')?;
        BASE64.decode(payload).ok()
    }

    /// Approximate size of the embedded image in bytes.
    pub fn payload_size(&self) -> usize {
        match self.0.split_once(',') {
            Some((_, payload)) => payload.len() * 3 / 4,
            None => self.0.len(),
        }
    }
}

impl fmt::Display for ImageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
