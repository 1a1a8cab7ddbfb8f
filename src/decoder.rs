//! Share link decoding.
//!
//! This module orchestrates the decoding process:
//! 1. Find the `#w=` marker and take the payload after it
//! 2. Decompress the payload back into JSON text
//! 3. Rebuild the message from its structured form
//! 4. Optionally re-check the producer rules
//!
//! [`decode`] NEVER returns an error. A string with no marker, a corrupted
//! payload and a tampered structure all come back as `None`, so the opening
//! side has exactly one failure branch. [`decode_strict`] keeps the reason
//! for callers that want to tell those cases apart.

use thiserror::Error;
use tracing::debug;

use crate::codec::{extract_payload, state, try_decompress, CompressionError, StateError};
use crate::message::{Message, ValidationError};

/// Why a share link did not decode.
#[derive(Error, Debug)]
pub enum DecodeFailure {
    #[error("No shared message in this link")]
    NoMarker,

    #[error("Shared message is corrupted: {0}")]
    Corrupted(#[from] CompressionError),

    #[error("Shared message is invalid: {0}")]
    Invalid(#[from] StateError),

    #[error("Shared message breaks the message rules: {0}")]
    PolicyViolation(#[from] ValidationError),
}

/// Configuration for the decoder.
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    /// Re-apply the producer rules (text length, photo cap, age range) to
    /// decoded messages. Off by default: a structurally sound message is
    /// accepted as sent.
    pub enforce_policy: bool,
}

/// Decodes a share link (or a bare `#w=` fragment).
///
/// # Important
/// This function NEVER fails loudly. Any problem at any stage yields `None`;
/// a partially filled message is never returned.
pub fn decode(transport: &str) -> Option<Message> {
    decode_with_config(transport, &DecoderConfig::default())
}

/// Decodes a share link with custom configuration.
pub fn decode_with_config(transport: &str, config: &DecoderConfig) -> Option<Message> {
    match decode_strict(transport, config) {
        Ok(message) => Some(message),
        Err(failure) => {
            debug!(%failure, "share link rejected");
            None
        }
    }
}

/// Decodes a share link, keeping the reason for a failure.
pub fn decode_strict(transport: &str, config: &DecoderConfig) -> Result<Message, DecodeFailure> {
    let payload = extract_payload(transport).ok_or(DecodeFailure::NoMarker)?;
    decode_payload(payload, config)
}

/// Decodes a payload that has already been taken out of its link.
pub fn decode_payload(payload: &str, config: &DecoderConfig) -> Result<Message, DecodeFailure> {
    let json = try_decompress(payload)?;
    debug!(payload_chars = payload.len(), json_bytes = json.len(), "payload decompressed");

    let message = state::from_json(&json)?;
    if config.enforce_policy {
        message.validate()?;
    }

    debug!(photos = message.photos().len(), theme = %message.theme, "message decoded");
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{compress, pack};
    use crate::encoder::encode;
    use crate::message::Theme;
    use crate::photo::ImageToken;

    fn mia() -> Message {
        Message::new("Mia", Theme::Dreamy, "Happy 5th birthday, Mia! Lots of love.").with_age(5)
    }

    fn link_for_json(json: &str) -> String {
        pack("https://wish.example/", &compress(json).unwrap())
    }

    #[test]
    fn test_decode_roundtrip() {
        let share = encode(&mia()).unwrap();
        assert_eq!(decode(&share.url), Some(mia()));
    }

    #[test]
    fn test_decode_bare_fragment() {
        let share = encode(&mia()).unwrap();
        let fragment = format!("#w={}", share.payload);
        assert_eq!(decode(&fragment), Some(mia()));
    }

    #[test]
    fn test_absent_inputs() {
        for input in ["", "#other=1", "https://wish.example/", "#w=", "#w=!!!garbage!!!"] {
            assert!(decode(input).is_none(), "input: {:?}", input);
        }
    }

    #[test]
    fn test_strict_distinguishes_failures() {
        let config = DecoderConfig::default();
        assert!(matches!(
            decode_strict("https://wish.example/", &config),
            Err(DecodeFailure::NoMarker)
        ));
        assert!(matches!(
            decode_strict("https://wish.example/#w=%%%", &config),
            Err(DecodeFailure::Corrupted(_))
        ));

        let no_theme = link_for_json(r#"{"name":"Mia","text":"Happy birthday!"}"#);
        assert!(matches!(
            decode_strict(&no_theme, &config),
            Err(DecodeFailure::Invalid(StateError::MissingField("theme")))
        ));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let links = [
            link_for_json(r#"{"theme":"dreamy","text":"Happy birthday!"}"#),
            link_for_json(r#"{"name":"Mia","theme":"dreamy"}"#),
            link_for_json(r#"{"name":"Mia","text":"Happy birthday!"}"#),
            link_for_json(r#"{"name":"","theme":"dreamy","text":"Happy birthday!"}"#),
        ];
        for link in &links {
            assert!(decode(link).is_none());
        }
    }

    #[test]
    fn test_unknown_theme_is_absent() {
        let link = link_for_json(r#"{"name":"Mia","theme":"neon","text":"Happy birthday!"}"#);
        assert!(decode(&link).is_none());
    }

    #[test]
    fn test_policy_enforcement_is_opt_in() {
        let photos: Vec<String> = (0..6).map(|i| format!("\"p{}\"", i)).collect();
        let json = format!(
            r#"{{"name":"Mia","theme":"retro","text":"Happy birthday!","photos":[{}]}}"#,
            photos.join(",")
        );
        let link = link_for_json(&json);

        let trusted = decode(&link).unwrap();
        assert_eq!(trusted.photos().len(), 6);
        assert_eq!(trusted.photos()[0], ImageToken::from_raw("p0".to_string()));

        let strict = DecoderConfig {
            enforce_policy: true,
        };
        assert!(decode_with_config(&link, &strict).is_none());
        assert!(matches!(
            decode_strict(&link, &strict),
            Err(DecodeFailure::PolicyViolation(ValidationError::TooManyPhotos { .. }))
        ));
    }

    #[test]
    fn test_valid_message_passes_policy() {
        let share = encode(&mia()).unwrap();
        let strict = DecoderConfig {
            enforce_policy: true,
        };
        assert_eq!(decode_with_config(&share.url, &strict), Some(mia()));
    }
}
