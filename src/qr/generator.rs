//! Share links rendered as QR codes.

use std::fs;
use std::path::Path;

use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;

/// Errors from rendering or scanning QR codes.
#[derive(Error, Debug)]
pub enum QrError {
    #[error("Link is {size} bytes, a QR code holds at most {max}")]
    LinkTooLong { size: usize, max: usize },

    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("Could not load or save QR image: {0}")]
    Image(String),

    #[error("QR code could not be decoded: {0}")]
    Unreadable(String),

    #[error("No QR code found in image")]
    NotFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// How a rendered QR code is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QrFormat {
    /// Grayscale PNG.
    #[default]
    Png,
    /// Block characters, for printing to a terminal.
    Ascii,
}

impl QrFormat {
    /// `.txt` files get block characters, everything else a PNG.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("txt") => QrFormat::Ascii,
            _ => QrFormat::Png,
        }
    }
}

/// Rendering settings.
#[derive(Debug, Clone)]
pub struct QrConfig {
    /// Error correction level. Low by default: share links are long and
    /// the budget-sized ones only fit at L.
    pub ec_level: EcLevel,
    /// Pixels per module in PNG output.
    pub module_size: u32,
    /// Draw the blank border scanners need.
    pub quiet_zone: bool,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::L,
            module_size: 6,
            quiet_zone: true,
        }
    }
}

/// Largest payload, in bytes, a version-40 QR code holds in byte mode.
pub fn byte_capacity(ec_level: EcLevel) -> usize {
    match ec_level {
        EcLevel::L => 2953,
        EcLevel::M => 2331,
        EcLevel::Q => 1663,
        EcLevel::H => 1273,
    }
}

/// Encodes a link verbatim in byte mode, so a phone camera opens it as a URL.
fn encode_link(link: &str, ec_level: EcLevel) -> Result<QrCode, QrError> {
    let max = byte_capacity(ec_level);
    if link.len() > max {
        return Err(QrError::LinkTooLong {
            size: link.len(),
            max,
        });
    }
    QrCode::with_error_correction_level(link.as_bytes(), ec_level)
        .map_err(|e| QrError::Encode(e.to_string()))
}

/// Renders a link as a grayscale image.
pub fn render_image(link: &str, config: &QrConfig) -> Result<GrayImage, QrError> {
    let code = encode_link(link, config.ec_level)?;
    Ok(code
        .render::<Luma<u8>>()
        .quiet_zone(config.quiet_zone)
        .module_dimensions(config.module_size, config.module_size)
        .build())
}

/// Renders a link as block characters, two columns per module so the code
/// stays roughly square in a terminal.
pub fn render_ascii(link: &str, config: &QrConfig) -> Result<String, QrError> {
    let code = encode_link(link, config.ec_level)?;
    Ok(code
        .render::<char>()
        .quiet_zone(config.quiet_zone)
        .module_dimensions(2, 1)
        .build())
}

/// Renders a link and writes it to `path` in the format its extension implies.
pub fn save_qr(link: &str, path: &Path, config: &QrConfig) -> Result<QrFormat, QrError> {
    let format = QrFormat::for_path(path);
    match format {
        QrFormat::Png => render_image(link, config)?
            .save(path)
            .map_err(|e| QrError::Image(e.to_string()))?,
        QrFormat::Ascii => fs::write(path, render_ascii(link, config)?)?,
    }
    Ok(format)
}
