//! QR codes for share links.
//!
//! A share link is stored verbatim in byte mode, so a phone camera opens it
//! like any other URL. A link within the 2000-character budget always fits
//! at the default error correction level.

mod generator;
mod reader;

pub use generator::{
    byte_capacity, render_ascii, render_image, save_qr, QrConfig, QrError, QrFormat,
};
pub use reader::{read_qr, read_qr_from_file};
