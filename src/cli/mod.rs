//! CLI command definitions and handlers

pub mod config;
pub mod handlers;
pub mod output;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::domain::AnnualEvent;
use output::OutputFormat;

/// briefing - fetch and reshape data from personal services as JSON
#[derive(Parser, Debug)]
#[command(name = "briefing", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/briefing/config.toml)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity on stderr (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read and edit notes through the Obsidian Local REST API
    Obsidian(ObsidianArgs),

    /// Fetch Slack mentions, activity, and DMs
    #[command(subcommand)]
    Slack(SlackCommand),

    /// Fetch Linear issues
    #[command(subcommand)]
    Linear(LinearCommand),

    /// Count days until upcoming dates
    Countdown(CountdownArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `obsidian` command
#[derive(Args, Debug)]
pub struct ObsidianArgs {
    /// Do not run `app:reload` after a write
    #[arg(long, global = true)]
    pub no_reload: bool,

    #[command(subcommand)]
    pub command: ObsidianCommand,
}

#[derive(Subcommand, Debug)]
pub enum ObsidianCommand {
    /// Print a note's content
    Read {
        /// Vault-relative note path
        path: String,
    },

    /// Check whether a note exists
    Exists {
        /// Vault-relative note path
        path: String,
    },

    /// Create or overwrite a note
    Create {
        /// Vault-relative note path
        path: String,
        /// Full note content
        #[arg(allow_hyphen_values = true)]
        content: String,
    },

    /// Append content to the end of a note (creates it if missing)
    Append {
        /// Vault-relative note path
        path: String,
        /// Content to append
        #[arg(allow_hyphen_values = true)]
        content: String,
    },

    /// Append content inside a section, adding the section if missing
    AppendSection {
        /// Vault-relative note path
        path: String,
        /// Section header, e.g. "## Tasks" (bare titles count as level 2)
        header: String,
        /// Content to insert
        #[arg(allow_hyphen_values = true)]
        content: String,
    },

    /// List available Obsidian commands
    ListCommands,

    /// Execute an Obsidian command by ID
    ExecuteCommand {
        /// Command ID, e.g. "app:reload"
        command_id: String,
    },

    /// Reload the Obsidian app without saving
    Reload,
}

#[derive(Subcommand, Debug)]
pub enum SlackCommand {
    /// Verify the token with auth.test
    Test,

    /// Messages mentioning you
    Mentions {
        /// Look-back window in hours
        #[arg(default_value_t = 24)]
        hours: u32,
    },

    /// Your own messages per conversation
    Activity {
        /// Look-back window in hours
        #[arg(default_value_t = 24)]
        hours: u32,
    },

    /// Direct message conversations with message counts
    Dms {
        /// Look-back window in hours (0 = all time)
        #[arg(default_value_t = 0)]
        hours: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum LinearCommand {
    /// Show the authenticated user
    Me,

    /// Open issues assigned to you
    Active {
        /// Maximum number of issues
        #[arg(default_value_t = 50)]
        limit: u32,
    },

    /// Your issues updated since midnight UTC
    UpdatedToday {
        /// Maximum number of issues
        #[arg(default_value_t = 50)]
        limit: u32,
    },

    /// Your issues completed since Monday UTC
    CompletedThisWeek {
        /// Maximum number of issues
        #[arg(default_value_t = 50)]
        limit: u32,
    },

    /// Your open issues in one team
    Team {
        /// Team key, e.g. "ENG"
        key: String,
        /// Maximum number of issues
        #[arg(default_value_t = 50)]
        limit: u32,
    },
}

/// Arguments for the `countdown` command
#[derive(Args, Debug)]
pub struct CountdownArgs {
    /// Reference date instead of today (YYYY-MM-DD)
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Extra event as NAME=MM-DD (can be specified multiple times)
    #[arg(short, long = "event", action = ArgAction::Append)]
    pub events: Vec<AnnualEvent>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

/// Arguments for the `completions` command
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for (bash, zsh, fish)
    #[arg(value_enum)]
    pub shell: Shell,
}
