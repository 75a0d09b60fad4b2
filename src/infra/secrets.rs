//! API key and token lookup.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

/// Where to look for a secret, tried in order: environment variable, file,
/// macOS Keychain generic password.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SecretSpec {
    pub env: Option<String>,
    pub file: Option<PathBuf>,
    pub keychain_service: Option<String>,
    pub keychain_account: Option<String>,
}

/// Errors while resolving a secret.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("secret file could not be read: {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{name} not found (checked: {checked})")]
    Missing {
        name: String,
        checked: String,
        help: Option<String>,
    },
}

impl SecretError {
    /// Extra fields for the JSON error payload.
    pub fn details(&self) -> Map<String, Value> {
        let mut map = Map::new();
        if let SecretError::Missing {
            help: Some(help), ..
        } = self
        {
            map.insert("help".to_string(), json!(help));
        }
        map
    }
}

impl SecretSpec {
    /// A spec backed by an environment variable and a Keychain entry.
    pub fn keychain(env: &str, service: &str, account: &str) -> Self {
        Self {
            env: Some(env.to_string()),
            file: None,
            keychain_service: Some(service.to_string()),
            keychain_account: Some(account.to_string()),
        }
    }

    /// A spec backed by an environment variable and a file.
    pub fn file(env: &str, path: PathBuf) -> Self {
        Self {
            env: Some(env.to_string()),
            file: Some(path),
            keychain_service: None,
            keychain_account: None,
        }
    }

    /// Resolves the secret. `name` is used in error messages.
    pub fn resolve(&self, name: &str) -> Result<String, SecretError> {
        let mut checked = Vec::new();

        if let Some(var) = &self.env {
            checked.push(format!("${}", var));
            if let Some(value) = std::env::var(var).ok().and_then(non_empty) {
                debug!(source = "env", var = %var, "resolved {}", name);
                return Ok(value);
            }
        }

        if let Some(path) = &self.file {
            let path = expand_home(path);
            checked.push(path.display().to_string());
            match std::fs::read_to_string(&path) {
                Ok(contents) => {
                    if let Some(value) = non_empty(contents) {
                        debug!(source = "file", path = %path.display(), "resolved {}", name);
                        return Ok(value);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(SecretError::File { path, source }),
            }
        }

        if let (Some(service), Some(account)) = (&self.keychain_service, &self.keychain_account) {
            checked.push(format!("keychain {}/{}", service, account));
            if let Some(value) = read_keychain(service, account) {
                debug!(source = "keychain", service = %service, "resolved {}", name);
                return Ok(value);
            }
        }

        Err(SecretError::Missing {
            name: name.to_string(),
            checked: if checked.is_empty() {
                "nothing configured".to_string()
            } else {
                checked.join(", ")
            },
            help: self.help(),
        })
    }

    /// Setup hint shown when the secret is missing.
    pub fn help(&self) -> Option<String> {
        if let (Some(service), Some(account)) = (&self.keychain_service, &self.keychain_account) {
            return Some(format!(
                "Run: security add-generic-password -s '{}' -a '{}' -w 'YOUR_API_KEY'",
                service, account
            ));
        }
        if let Some(path) = &self.file {
            return Some(format!("Save the key to {}", expand_home(path).display()));
        }
        self.env
            .as_ref()
            .map(|var| format!("Set the {} environment variable", var))
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads a generic password with the macOS `security` tool.
///
/// Any failure (tool absent, entry missing) is treated as "not found".
fn read_keychain(service: &str, account: &str) -> Option<String> {
    let output = Command::new("security")
        .args(["find-generic-password", "-s", service, "-a", account, "-w"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    non_empty(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Expands a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
