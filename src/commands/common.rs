//! Arguments and helpers shared by several commands.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use wishlink::budget::BudgetReport;
use wishlink::photo::RawImage;
use wishlink::qr::read_qr_from_file;
use wishlink::{Message, ShareConfig, Theme};

/// The message being authored.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Name of the birthday person
    #[arg(short, long)]
    pub name: String,

    /// Age being celebrated (0 = unspecified)
    #[arg(short, long, default_value_t = 0)]
    pub age: u8,

    /// Visual theme: vibrant, dreamy, starry or retro
    #[arg(short, long, default_value = "vibrant")]
    pub theme: Theme,

    /// Wish text (10 to 300 characters)
    #[arg(short = 'm', long)]
    pub text: String,

    /// Photo to attach; repeat for up to 5 photos
    #[arg(short, long = "photo")]
    pub photos: Vec<PathBuf>,

    /// Voice note reference to carry along
    #[arg(long)]
    pub voice_note: Option<String>,

    /// Base URL for the share link (overrides the config file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl MessageArgs {
    /// Loads the config file and applies command-line overrides.
    pub fn share_config(&self) -> Result<ShareConfig> {
        let mut config = load_config(self.config.as_deref())?;
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        Ok(config)
    }

    /// Builds the message without photos.
    pub fn message(&self) -> Message {
        let message = Message::new(self.name.as_str(), self.theme, self.text.as_str()).with_age(self.age);
        match &self.voice_note {
            Some(note) => message.with_voice_note(note.as_str()),
            None => message,
        }
    }

    /// Reads every `--photo` file into memory.
    pub fn read_photos(&self) -> Result<Vec<RawImage>> {
        self.photos
            .iter()
            .map(|path| {
                let bytes = fs::read(path)
                    .with_context(|| format!("Failed to read photo {}", path.display()))?;
                Ok(RawImage::new(bytes, media_type_for_path(path)))
            })
            .collect()
    }
}

/// Loads the config file, or defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<ShareConfig> {
    ShareConfig::load_or_default(path).with_context(|| match path {
        Some(path) => format!("Failed to load config from {}", path.display()),
        None => "Failed to load default config".to_string(),
    })
}

/// Media type implied by a file extension.
///
/// Unknown extensions map to `application/octet-stream`, which the
/// compressor rejects as unsupported.
pub fn media_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Gets a share link from the argument, a QR code image, or stdin.
pub fn read_link(link: Option<&str>, qr: Option<&Path>) -> Result<String> {
    if let Some(path) = qr {
        return read_qr_from_file(path)
            .with_context(|| format!("Failed to read QR code from {}", path.display()));
    }

    match link {
        Some(link) => Ok(link.to_string()),
        None => {
            eprintln!("Reading share link from stdin (Ctrl+D to finish):");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read link from stdin")?;
            Ok(buffer.trim().to_string())
        }
    }
}

/// Prints a budget report.
pub fn print_budget(report: &BudgetReport) {
    println!(
        "  Link length: {} / {} chars (payload {} chars)",
        report.link_chars, report.budget_chars, report.payload_chars
    );
    for (index, cost) in report.photo_costs.iter().enumerate() {
        println!("  Photo {}: ~{} chars", index + 1, cost);
    }
    if let Some(warning) = report.warning() {
        println!("  WARNING: {}", warning);
        if let Some(index) = report.costliest_photo() {
            println!("  Dropping photo {} would save the most space", index + 1);
        }
    }
}
