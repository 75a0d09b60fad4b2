//! Isolated test environment with a temp config directory.

#![allow(dead_code)]

use super::BriefingCommand;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment holding a config file in a temp directory.
///
/// Every secret points at an environment variable that tests set
/// explicitly, so nothing falls through to the real keychain or home
/// directory.
pub struct TestEnv {
    /// The temporary directory (kept for lifetime management)
    _temp_dir: TempDir,
    config_path: PathBuf,
}

/// Config shared by every environment: unreachable services, short
/// timeouts, env-only secrets.
const BASE_CONFIG: &str = r#"
[http]
timeout_secs = 2

[obsidian]
url = "https://127.0.0.1:1"
reload_after_write = false

[obsidian.api_key]
env = "BRIEFING_TEST_OBSIDIAN_KEY"

[slack]
url = "http://127.0.0.1:1"

[slack.token]
env = "BRIEFING_TEST_SLACK_TOKEN"

[linear]
url = "http://127.0.0.1:1"

[linear.api_key]
env = "BRIEFING_TEST_LINEAR_KEY"
"#;

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(BASE_CONFIG)
    }

    /// Creates an environment whose config file has the given contents.
    pub fn with_config(contents: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, contents).expect("Failed to write config");
        Self {
            _temp_dir: temp_dir,
            config_path,
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Creates a BriefingCommand using this environment's config file.
    pub fn cmd(&self) -> BriefingCommand {
        BriefingCommand::new().config(&self.config_path)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
