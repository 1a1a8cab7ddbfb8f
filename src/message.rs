//! The wish message and the producer-side rules it must satisfy.
//!
//! A [`Message`] is built once from user input, checked with
//! [`Message::validate`], and handed to the encoder as an immutable snapshot.
//! The photo cap is enforced as photos are added, so a message holding more
//! than [`MAX_PHOTOS`] photos can only come from decoding a hand-crafted link.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::photo::ImageToken;
use crate::{MAX_AGE, MAX_PHOTOS, TEXT_MAX_LEN, TEXT_MIN_LEN};

/// Producer-side validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is empty")]
    EmptyName,

    #[error("Age {0} is out of range (0 for unspecified, otherwise 1-{max})", max = MAX_AGE)]
    AgeOutOfRange(u8),

    #[error("Text is {len} characters, must be between {min} and {max}")]
    TextLength { len: usize, min: usize, max: usize },

    #[error("Too many photos: at most {max} allowed")]
    TooManyPhotos { max: usize },
}

/// Visual theme of a wish.
///
/// The set is closed: a theme name that is not listed here never decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Bold colors, energetic vibe.
    #[default]
    Vibrant,
    /// Pastels, gentle and calm.
    Dreamy,
    /// Dark elegance, golden accents.
    Starry,
    /// Pixel art, nostalgic vibes.
    Retro,
}

impl Theme {
    /// Every known theme, in display order.
    pub const ALL: [Theme; 4] = [Theme::Vibrant, Theme::Dreamy, Theme::Starry, Theme::Retro];

    /// Wire name of the theme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Vibrant => "vibrant",
            Theme::Dreamy => "dreamy",
            Theme::Starry => "starry",
            Theme::Retro => "retro",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known theme.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown theme '{0}' (expected one of: vibrant, dreamy, starry, retro)")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == s)
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

/// A birthday wish: everything the receiving side needs to replay it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Name of the birthday person.
    pub name: String,
    /// Age being celebrated, 0 when unspecified.
    pub age: u8,
    /// Visual theme.
    pub theme: Theme,
    /// Body text.
    pub text: String,
    /// Optional text for a read-aloud voice note.
    pub voice_note: Option<String>,
    photos: Vec<ImageToken>,
}

impl Message {
    /// Creates a message with no age, no photos and no voice note.
    pub fn new(name: impl Into<String>, theme: Theme, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age: 0,
            theme,
            text: text.into(),
            voice_note: None,
            photos: Vec::new(),
        }
    }

    /// Sets the age (0 for unspecified).
    pub fn with_age(mut self, age: u8) -> Self {
        self.age = age;
        self
    }

    /// Sets the voice note text.
    pub fn with_voice_note(mut self, voice_note: impl Into<String>) -> Self {
        self.voice_note = Some(voice_note.into());
        self
    }

    /// Builds a message from decoded parts without applying the photo cap.
    pub(crate) fn from_parts(
        name: String,
        age: u8,
        theme: Theme,
        text: String,
        photos: Vec<ImageToken>,
        voice_note: Option<String>,
    ) -> Self {
        Self {
            name,
            age,
            theme,
            text,
            voice_note,
            photos,
        }
    }

    /// Photos in display order.
    pub fn photos(&self) -> &[ImageToken] {
        &self.photos
    }

    /// Remaining photo slots before the cap is reached.
    pub fn remaining_photo_slots(&self) -> usize {
        MAX_PHOTOS.saturating_sub(self.photos.len())
    }

    /// Appends a photo, refusing it once the message already holds
    /// [`MAX_PHOTOS`] photos.
    pub fn add_photo(&mut self, photo: ImageToken) -> Result<(), ValidationError> {
        if self.photos.len() >= MAX_PHOTOS {
            return Err(ValidationError::TooManyPhotos { max: MAX_PHOTOS });
        }
        self.photos.push(photo);
        Ok(())
    }

    /// Removes the photo at `index`, shifting later photos forward.
    pub fn remove_photo(&mut self, index: usize) -> Option<ImageToken> {
        if index < self.photos.len() {
            Some(self.photos.remove(index))
        } else {
            None
        }
    }

    /// Checks every producer-side rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.age > MAX_AGE {
            return Err(ValidationError::AgeOutOfRange(self.age));
        }
        validate_text(&self.text)?;
        if self.photos.len() > MAX_PHOTOS {
            return Err(ValidationError::TooManyPhotos { max: MAX_PHOTOS });
        }
        Ok(())
    }
}

/// Checks the body text length bounds (inclusive, untrimmed, in characters).
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    let len = text.chars().count();
    if (TEXT_MIN_LEN..=TEXT_MAX_LEN).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::TextLength {
            len,
            min: TEXT_MIN_LEN,
            max: TEXT_MAX_LEN,
        })
    }
}
