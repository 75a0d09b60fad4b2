//! Command handlers for the CLI.

mod countdown;
mod linear;
mod obsidian;
mod slack;

#[cfg(test)]
pub(crate) mod tests;

use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, CompletionsArgs};

// Re-export public items
pub use countdown::handle_countdown;
pub use linear::handle_linear;
pub use obsidian::handle_obsidian;
pub use slack::handle_slack;

/// Writes a completion script for the requested shell to stdout.
pub fn handle_completions(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
