//! Budget command - measure a wish against the link length budget.

use anyhow::{Context, Result};
use clap::Args;

use wishlink::budget::advise;
use wishlink::ImageCompressor;

use super::common::{print_budget, MessageArgs};
use super::CommandExecutor;

/// Measure how long the share link for a wish would be.
///
/// Nothing is printed but the report; use `share` to get the link itself.
#[derive(Args, Debug)]
pub struct BudgetCommand {
    #[command(flatten)]
    pub message: MessageArgs,
}

impl CommandExecutor for BudgetCommand {
    fn execute(&self) -> Result<()> {
        let config = self.message.share_config()?;
        let photos = self.message.read_photos()?;
        let compressor = ImageCompressor::new(config.image.clone());

        let mut message = self.message.message();
        for (index, result) in compressor.compress_batch(&photos).into_iter().enumerate() {
            match result {
                Ok(photo) => message
                    .add_photo(photo.token)
                    .context("Too many photos")?,
                Err(error) => eprintln!(
                    "Skipped photo {} ({}): {}",
                    index + 1,
                    self.message.photos[index].display(),
                    error
                ),
            }
        }

        let report = advise(&message, &config.base_url, config.budget_chars)
            .context("Failed to measure share link")?;

        println!("Budget report for {}:", message.name);
        print_budget(&report);
        if let Err(error) = message.validate() {
            println!("  NOTE: this wish cannot be shared yet: {}", error);
        }

        Ok(())
    }
}
