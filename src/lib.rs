//! briefing - fetch and reshape data from personal services as JSON

pub mod cli;
pub mod domain;
pub mod infra;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        handle_completions, handle_countdown, handle_linear, handle_obsidian, handle_slack,
    },
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = || -> Result<Config> {
        let config = Config::load(cli.config.as_deref())?;
        debug!(timeout_secs = config.http.timeout_secs, "loaded configuration");
        Ok(config)
    };

    match &cli.command {
        Command::Obsidian(args) => handle_obsidian(args, &config()?),
        Command::Slack(command) => handle_slack(command, &config()?),
        Command::Linear(command) => handle_linear(command, &config()?),
        Command::Countdown(args) => handle_countdown(args),
        Command::Completions(args) => handle_completions(args),
    }
}

/// Logs go to stderr so stdout stays pure JSON. `RUST_LOG` overrides `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
