//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod budget;
mod common;
mod inspect;
mod open;
mod share;

pub use budget::BudgetCommand;
pub use inspect::InspectCommand;
pub use open::OpenCommand;
pub use share::ShareCommand;

use anyhow::Result;

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self) -> Result<()>;
}
