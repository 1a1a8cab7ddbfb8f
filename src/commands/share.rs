//! Share command - build a share link from a wish.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use wishlink::photo::format_bytes;
use wishlink::qr::{save_qr, QrConfig};
use wishlink::{encode_with_photos, ImageCompressor};

use super::common::{print_budget, MessageArgs};
use super::CommandExecutor;

/// Build a share link for a birthday wish.
///
/// Photos are downscaled and re-encoded before they go into the link. A photo
/// that cannot be processed is reported and left out.
#[derive(Args, Debug)]
pub struct ShareCommand {
    #[command(flatten)]
    pub message: MessageArgs,

    /// Also save the link as a QR code (PNG, or block characters for .txt)
    #[arg(long)]
    pub qr: Option<PathBuf>,
}

impl CommandExecutor for ShareCommand {
    fn execute(&self) -> Result<()> {
        let config = self.message.share_config()?;
        let photos = self.message.read_photos()?;
        let compressor = ImageCompressor::new(config.image.clone());

        let share = encode_with_photos(
            &self.message.message(),
            &photos,
            &compressor,
            &config.encoder_config(),
        )
        .context("Failed to build share link")?;

        for failure in &share.photo_failures {
            eprintln!(
                "Skipped photo {} ({}): {}",
                failure.index + 1,
                self.message.photos[failure.index].display(),
                failure.error
            );
        }

        println!("{}", share.url);
        eprintln!();
        eprintln!("Share link for {}:", share.message.name);
        eprintln!("  Theme: {}", share.message.theme);
        eprintln!("  Photos: {}", share.photos.len());
        for (index, photo) in share.photos.iter().enumerate() {
            eprintln!(
                "    {}: {}x{} -> {}x{}, compressed: {} -> {}",
                index + 1,
                photo.source.width,
                photo.source.height,
                photo.output.width,
                photo.output.height,
                format_bytes(photo.input_bytes),
                format_bytes(photo.encoded_bytes)
            );
        }
        print_budget(&share.budget);

        if let Some(qr_path) = &self.qr {
            let format = save_qr(&share.url, qr_path, &QrConfig::default())
                .context("Failed to generate QR code")?;
            eprintln!("QR code ({:?}) saved to: {}", format, qr_path.display());
        }

        Ok(())
    }
}
