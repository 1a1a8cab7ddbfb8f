//! Open command - show the wish carried by a share link.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use wishlink::codec::serialize;
use wishlink::decode_with_config;

use super::common::{load_config, read_link};
use super::CommandExecutor;

/// Open a share link and print the wish inside it.
#[derive(Args, Debug)]
pub struct OpenCommand {
    /// Share link (reads from stdin if neither this nor --qr is given)
    #[arg(conflicts_with = "qr")]
    pub link: Option<String>,

    /// Image containing a QR code of the share link
    #[arg(long)]
    pub qr: Option<PathBuf>,

    /// Print the wish as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl CommandExecutor for OpenCommand {
    fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let link = read_link(self.link.as_deref(), self.qr.as_deref())?;

        let Some(message) = decode_with_config(&link, &config.decoder_config()) else {
            anyhow::bail!("No valid shared message");
        };

        if self.json {
            let json = serde_json::to_string_pretty(&serialize(&message))
                .context("Failed to format message")?;
            println!("{}", json);
            return Ok(());
        }

        match message.age {
            0 => println!("Happy birthday, {}!", message.name),
            age => println!("Happy {} birthday, {}!", ordinal(age), message.name),
        }
        println!("  Theme: {}", message.theme);
        println!();
        println!("{}", message.text);
        println!();
        println!("  Photos: {}", message.photos().len());
        for (index, photo) in message.photos().iter().enumerate() {
            println!(
                "    {}: {} ({} bytes)",
                index + 1,
                photo.media_type().unwrap_or("unknown"),
                photo.payload_size()
            );
        }
        if let Some(note) = &message.voice_note {
            println!("  Voice note: {}", note);
        }

        Ok(())
    }
}

fn ordinal(n: u8) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
