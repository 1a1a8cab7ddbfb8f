//! # Wishlink - a whole birthday wish in one link
//!
//! Wishlink packs a small multimedia message (a name, an age, a theme, a few
//! lines of text and up to five photos) into a single URL. The message lives
//! entirely in the URL fragment, so nothing is stored on a server and nothing
//! is sent to one when the link is opened.
//!
//! ## Pipeline
//!
//! Encoding runs, leaf to root:
//! 1. **Photos** are downscaled (never upscaled) and re-encoded as JPEG data
//!    URLs ([`photo`]), concurrently, joining on all of them.
//! 2. The [`Message`] is mapped to a field-keyed JSON form ([`codec::state`]).
//! 3. The JSON text is DEFLATE-compressed into a URL-safe alphabet
//!    ([`codec::compression`]).
//! 4. The payload is placed after the `#w=` marker ([`codec::transport`]).
//!
//! Decoding reverses the chain and **never fails**: a missing, corrupted or
//! tampered link all come back as `None` (see [`decoder`]). Callers that need
//! to tell those apart use [`decode_strict`].
//!
//! ## Example Usage
//!
//! ```rust
//! use wishlink::{decode, encode, Message, Theme};
//!
//! let wish = Message::new("Mia", Theme::Dreamy, "Happy 5th birthday, Mia! Lots of love.")
//!     .with_age(5);
//!
//! let share = encode(&wish).unwrap();
//! assert!(share.url.contains("#w="));
//!
//! let opened = decode(&share.url).unwrap();
//! assert_eq!(opened, wish);
//! ```
//!
//! ## Modules
//!
//! - [`message`]: the message model and producer-side rules
//! - [`photo`]: photo downscaling and re-encoding
//! - [`codec`]: structured form, text compression, transport string
//! - [`encoder`] / [`decoder`]: the full pipelines
//! - [`budget`]: link length advice
//! - [`flow`]: create / share / experience screen state machine
//! - [`config`]: TOML-loadable settings
//! - [`qr`]: QR rendering and reading of share links

/// Maximum number of photos in one message.
pub const MAX_PHOTOS: usize = 5;

/// Minimum body text length, in characters.
pub const TEXT_MIN_LEN: usize = 10;

/// Maximum body text length, in characters.
pub const TEXT_MAX_LEN: usize = 300;

/// Highest age accepted by the producer (0 means unspecified).
pub const MAX_AGE: u8 = 120;

/// Recommended maximum length of a share link, in characters.
pub const LINK_BUDGET_CHARS: usize = 2000;

pub mod budget;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod flow;
pub mod message;
pub mod photo;
pub mod qr;

pub use budget::{advise, BudgetReport, BudgetVerdict, OverBudgetWarning};
pub use codec::{CompressionError, StateError};
pub use config::{ConfigError, ShareConfig};
pub use decoder::{decode, decode_strict, decode_with_config, DecodeFailure, DecoderConfig};
pub use encoder::{
    encode, encode_with_config, encode_with_photos, EncodedShare, EncoderConfig, EncoderError,
    PhotoFailure,
};
pub use flow::{Event, FlowError, Screen};
pub use message::{Message, Theme, ValidationError};
pub use photo::{CompressedImage, ImageCompressor, ImageConfig, ImageError, ImageToken, RawImage};
