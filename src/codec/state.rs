//! Mapping between [`Message`] and its structured form.
//!
//! The structured form is a JSON object with fixed keys:
//!
//! | Key | Type | Required |
//! |---|---|---|
//! | `name` | string, non-blank | yes |
//! | `age` | integer 0-255 | no (0) |
//! | `theme` | one of the known theme names | yes |
//! | `text` | string, non-empty | yes |
//! | `photos` | array of token strings | no (empty) |
//! | `voiceNote` | string | no |
//!
//! Deserialization checks structure only. Producer rules such as the text
//! length bounds and the photo cap are left to [`Message::validate`].

use serde_json::{Map, Value};
use thiserror::Error;

use crate::message::{Message, Theme};
use crate::photo::ImageToken;

/// A field-keyed structured form of a message.
pub type StructuredForm = Map<String, Value>;

/// Field names of the structured form.
pub mod fields {
    pub const NAME: &str = "name";
    pub const AGE: &str = "age";
    pub const THEME: &str = "theme";
    pub const TEXT: &str = "text";
    pub const PHOTOS: &str = "photos";
    pub const VOICE_NOTE: &str = "voiceNote";
}

/// Errors that can occur when rebuilding a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Missing or empty field: {0}")]
    MissingField(&'static str),

    #[error("Unknown theme variant: {0}")]
    UnknownVariant(String),

    #[error("Invalid field: {0}")]
    InvalidField(&'static str),

    #[error("Malformed structured form: {0}")]
    Malformed(String),
}

/// Maps a message to its structured form.
///
/// `voiceNote` is omitted when absent; every other key is always present.
pub fn serialize(message: &Message) -> StructuredForm {
    let mut form = Map::new();
    form.insert(fields::NAME.to_string(), Value::from(message.name.as_str()));
    form.insert(fields::AGE.to_string(), Value::from(message.age));
    form.insert(fields::THEME.to_string(), Value::from(message.theme.as_str()));
    form.insert(fields::TEXT.to_string(), Value::from(message.text.as_str()));
    form.insert(
        fields::PHOTOS.to_string(),
        Value::Array(
            message
                .photos()
                .iter()
                .map(|photo| Value::from(photo.as_str()))
                .collect(),
        ),
    );
    if let Some(voice_note) = &message.voice_note {
        form.insert(fields::VOICE_NOTE.to_string(), Value::from(voice_note.as_str()));
    }
    form
}

/// Rebuilds a message from its structured form.
///
/// Fails on any structural problem; never substitutes defaults for the
/// required fields.
pub fn deserialize(form: &StructuredForm) -> Result<Message, StateError> {
    let name = required_str(form, fields::NAME)?;
    if name.trim().is_empty() {
        return Err(StateError::MissingField(fields::NAME));
    }

    let theme_name = required_str(form, fields::THEME)?;
    let theme = theme_name
        .parse::<Theme>()
        .map_err(|_| StateError::UnknownVariant(theme_name.to_string()))?;

    let text = required_str(form, fields::TEXT)?;

    let age = match form.get(fields::AGE) {
        None | Some(Value::Null) => 0,
        Some(value) => value
            .as_u64()
            .and_then(|age| u8::try_from(age).ok())
            .ok_or(StateError::InvalidField(fields::AGE))?,
    };

    let photos = match form.get(fields::PHOTOS) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|token| ImageToken::from_raw(token.to_string()))
                    .ok_or(StateError::InvalidField(fields::PHOTOS))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(StateError::InvalidField(fields::PHOTOS)),
    };

    let voice_note = match form.get(fields::VOICE_NOTE) {
        None | Some(Value::Null) => None,
        Some(Value::String(note)) => Some(note.clone()),
        Some(_) => return Err(StateError::InvalidField(fields::VOICE_NOTE)),
    };

    Ok(Message::from_parts(
        name.to_string(),
        age,
        theme,
        text.to_string(),
        photos,
        voice_note,
    ))
}

/// A required string field that is present and non-empty.
fn required_str<'a>(form: &'a StructuredForm, field: &'static str) -> Result<&'a str, StateError> {
    match form.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value),
        _ => Err(StateError::MissingField(field)),
    }
}

/// Serializes a message to compact JSON text.
pub fn to_json(message: &Message) -> String {
    Value::Object(serialize(message)).to_string()
}

/// Parses JSON text and rebuilds the message.
pub fn from_json(json: &str) -> Result<Message, StateError> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(form)) => deserialize(&form),
        Ok(_) => Err(StateError::Malformed("expected a JSON object".to_string())),
        Err(e) => Err(StateError::Malformed(e.to_string())),
    }
}
