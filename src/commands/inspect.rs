//! Inspect command - explain why a share link does or does not open.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use wishlink::codec::{extract_payload, try_decompress};
use wishlink::{decode_strict, DecodeFailure};

use super::common::{load_config, read_link};
use super::CommandExecutor;

/// Check a share link and report what is wrong with it, if anything.
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Share link (reads from stdin if neither this nor --qr is given)
    #[arg(conflicts_with = "qr")]
    pub link: Option<String>,

    /// Image containing a QR code of the share link
    #[arg(long)]
    pub qr: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl CommandExecutor for InspectCommand {
    fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let link = read_link(self.link.as_deref(), self.qr.as_deref())?;

        println!("Link length: {} chars", link.chars().count());
        if let Some(payload) = extract_payload(&link) {
            println!("Payload length: {} chars", payload.len());
            if let Ok(json) = try_decompress(payload) {
                println!("Decompressed size: {} bytes", json.len());
            }
        }

        match decode_strict(&link, &config.decoder_config()) {
            Ok(message) => {
                println!("Status: OK");
                println!("  Name: {}", message.name);
                println!("  Theme: {}", message.theme);
                println!("  Text: {} chars", message.text.chars().count());
                println!("  Photos: {}", message.photos().len());
                Ok(())
            }
            Err(failure) => {
                let status = match &failure {
                    DecodeFailure::NoMarker => "no marker",
                    DecodeFailure::Corrupted(_) => "corrupted payload",
                    DecodeFailure::Invalid(_) => "invalid structure",
                    DecodeFailure::PolicyViolation(_) => "policy violation",
                };
                println!("Status: {}", status);
                anyhow::bail!(failure)
            }
        }
    }
}
