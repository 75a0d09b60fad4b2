//! Configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::infra::SecretSpec;
use crate::infra::linear::DEFAULT_LINEAR_URL;
use crate::infra::obsidian::DEFAULT_OBSIDIAN_URL;
use crate::infra::slack::DEFAULT_SLACK_URL;

const KEYCHAIN_ACCOUNT: &str = "personal-assistant";

/// Application configuration loaded from config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub obsidian: ObsidianConfig,
    pub slack: SlackConfig,
    pub linear: LinearConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ObsidianConfig {
    /// Base URL of the Local REST API plugin
    pub url: String,
    pub api_key: SecretSpec,
    /// Run `app:reload` after every successful write
    pub reload_after_write: bool,
}

impl Default for ObsidianConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OBSIDIAN_URL.to_string(),
            api_key: SecretSpec::keychain("OBSIDIAN_API_KEY", "obsidian-rest-api", KEYCHAIN_ACCOUNT),
            reload_after_write: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub url: String,
    pub token: SecretSpec,
    /// Names (real or display) whose DMs are listed first
    pub priority_users: Vec<String>,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SLACK_URL.to_string(),
            token: SecretSpec::keychain("SLACK_TOKEN", "slack-api", KEYCHAIN_ACCOUNT),
            priority_users: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    pub url: String,
    pub api_key: SecretSpec,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_LINEAR_URL.to_string(),
            api_key: SecretSpec::file(
                "LINEAR_API_KEY",
                PathBuf::from("~/.claude/linear_api_key.txt"),
            ),
        }
    }
}

impl Config {
    /// Load configuration, with the CLI `--config` path taking precedence
    /// over the default location.
    ///
    /// Returns default config if the default file doesn't exist. An explicit
    /// path must exist.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let config_path = match cli_path {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path();
                if !path.exists() {
                    return Ok(Self::default());
                }
                path
            }
        };

        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Returns the path to the config file.
    ///
    /// Default: `~/.config/briefing/config.toml`
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("briefing")
            .join("config.toml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}
