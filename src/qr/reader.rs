//! Scanning share links back out of QR images.

use image::DynamicImage;
use rqrr::PreparedImage;
use std::path::Path;
use tracing::debug;

use super::QrError;

/// Returns the text of the first decodable QR code in an image.
///
/// A photo of a printed card may catch several codes; unreadable ones are
/// skipped.
pub fn read_qr(image: &DynamicImage) -> Result<String, QrError> {
    let gray = image.to_luma8();
    let (width, height) = gray.dimensions();
    let mut prepared = PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| gray.get_pixel(x as u32, y as u32)[0],
    );

    let grids = prepared.detect_grids();
    debug!(found = grids.len(), "QR grids detected");

    let mut last_error = QrError::NotFound;
    for grid in &grids {
        match grid.decode() {
            Ok((_, content)) => return Ok(content),
            Err(e) => last_error = QrError::Unreadable(format!("{:?}", e)),
        }
    }
    Err(last_error)
}

/// Loads an image file and reads the QR code in it.
pub fn read_qr_from_file(path: &Path) -> Result<String, QrError> {
    let image = image::open(path).map_err(|e| QrError::Image(e.to_string()))?;
    read_qr(&image)
}
