//! Wishlink - a whole birthday wish in one link
//!
//! A CLI for building and opening self-contained share links. The wish
//! (text, theme, photos) lives entirely in the link fragment.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{BudgetCommand, CommandExecutor, InspectCommand, OpenCommand, ShareCommand};

/// Wishlink - a whole birthday wish in one link
///
/// Photos are shrunk, the wish is compressed, and everything goes into the
/// part of the URL after `#w=`. Nothing is stored on a server.
#[derive(Parser)]
#[command(name = "wishlink")]
#[command(version)]
#[command(about = "Pack a birthday wish (text, theme, photos) into a single share link")]
#[command(long_about = None)]
struct Cli {
    /// Show pipeline details (photo sizes, payload stages)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a share link for a wish
    Share(ShareCommand),

    /// Open a share link and show the wish
    Open(OpenCommand),

    /// Explain why a share link does or does not open
    Inspect(InspectCommand),

    /// Measure a wish against the link length budget
    Budget(BudgetCommand),
}

impl Commands {
    fn executor(&self) -> &dyn CommandExecutor {
        match self {
            Commands::Share(cmd) => cmd,
            Commands::Open(cmd) => cmd,
            Commands::Inspect(cmd) => cmd,
            Commands::Budget(cmd) => cmd,
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "wishlink=debug,warn" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    cli.command.executor().execute()
}
