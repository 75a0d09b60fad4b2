//! Fluent wrapper around assert_cmd::Command.

// Not every helper is used by every test binary
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Fluent wrapper around `assert_cmd::Command` for the `briefing` binary.
pub struct BriefingCommand {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl BriefingCommand {
    /// Creates a new command for the `briefing` binary.
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Sets the `--config` option.
    pub fn config(mut self, path: &Path) -> Self {
        self.args.push("--config".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Sets an environment variable for the child process.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("briefing").expect("Failed to find briefing binary");
        cmd.env_remove("RUST_LOG");
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    /// Runs the command, expects failure, and parses stderr as JSON.
    pub fn error_json<T: DeserializeOwned>(self) -> T {
        let output = self.assert().failure().get_output().stderr.clone();
        let stderr = String::from_utf8(output).expect("Stderr was not valid UTF-8");
        serde_json::from_str(&stderr)
            .unwrap_or_else(|e| panic!("Failed to parse stderr as JSON ({}): {}", e, stderr))
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for `countdown` pinned to a date.
    pub fn countdown_on(self, date: &str) -> Self {
        self.args(["countdown", "--today", date])
    }

    /// Configures for an `obsidian` subcommand.
    pub fn obsidian<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args(["obsidian"]).args(args)
    }

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }
}

impl Default for BriefingCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_runs_binary() {
        BriefingCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_shortcuts() {
        let cmd = BriefingCommand::new()
            .countdown_on("2026-10-18")
            .format_json();
        assert_eq!(
            cmd.get_args(),
            ["countdown", "--today", "2026-10-18", "--format", "json"]
        );
    }
}
