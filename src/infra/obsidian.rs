//! Client for the Obsidian Local REST API plugin.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info};

/// Default address of the plugin's HTTPS listener.
pub const DEFAULT_OBSIDIAN_URL: &str = "https://127.0.0.1:27124";

/// Command ID of "Reload app without saving".
pub const RELOAD_COMMAND: &str = "app:reload";

/// Errors from the Obsidian REST API.
#[derive(Debug, Error)]
pub enum ObsidianError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    Http {
        status: u16,
        reason: String,
        url: String,
        details: Value,
    },

    #[error("connection error: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ObsidianError {
    /// Extra fields for the JSON error payload.
    pub fn details(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            ObsidianError::Client(_) => {}
            ObsidianError::Http {
                status,
                url,
                details,
                ..
            } => {
                map.insert("status".to_string(), json!(status));
                map.insert("details".to_string(), details.clone());
                map.insert("url".to_string(), json!(url));
            }
            ObsidianError::Connection { url, .. } => {
                map.insert("url".to_string(), json!(url));
                map.insert(
                    "help".to_string(),
                    json!("Is Obsidian running with Local REST API plugin enabled?"),
                );
            }
            ObsidianError::Decode { url, .. } => {
                map.insert("url".to_string(), json!(url));
            }
        }
        map
    }
}

/// Whole-document access to a vault plus command execution.
///
/// Paths are vault-relative (e.g. `2025/11/2025-11-08.md`).
pub trait Vault {
    /// Returns the note text, or `None` if the note does not exist.
    fn read(&self, path: &str) -> Result<Option<String>, ObsidianError>;

    /// Creates or overwrites the note with `content`.
    fn write(&self, path: &str, content: &str) -> Result<(), ObsidianError>;

    /// Lists the commands registered in the running app.
    fn list_commands(&self) -> Result<Value, ObsidianError>;

    /// Executes a command by ID.
    fn execute_command(&self, command_id: &str) -> Result<(), ObsidianError>;
}

/// Blocking HTTPS client for the REST plugin.
pub struct ObsidianClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ObsidianClient {
    /// Creates a client. The plugin serves a self-signed certificate on
    /// localhost, so certificate verification is disabled.
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, ObsidianError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()
            .map_err(ObsidianError::Client)?;

        let base_url = base_url.trim_end_matches('/').to_string();
        info!("Obsidian client initialized for: {}", base_url);

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn vault_url(&self, path: &str) -> String {
        format!("{}/vault/{}", self.base_url, encode_vault_path(path))
    }

    fn send(
        &self,
        url: &str,
        request: reqwest::blocking::RequestBuilder,
    ) -> Result<Response, ObsidianError> {
        request
            .bearer_auth(&self.api_key)
            .send()
            .map_err(|source| ObsidianError::Connection {
                url: url.to_string(),
                source,
            })
    }
}

impl Vault for ObsidianClient {
    fn read(&self, path: &str) -> Result<Option<String>, ObsidianError> {
        let url = self.vault_url(path);
        debug!("Reading note: {}", url);

        let response = self.send(&url, self.client.get(&url))?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Note not found: {}", path);
            return Ok(None);
        }
        let response = check_status(&url, response)?;
        let text = response
            .text()
            .map_err(|source| ObsidianError::Decode { url, source })?;
        Ok(Some(text))
    }

    fn write(&self, path: &str, content: &str) -> Result<(), ObsidianError> {
        let url = self.vault_url(path);
        debug!("Writing note: {} ({} bytes)", url, content.len());

        let request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, "text/markdown")
            .body(content.to_string());
        check_status(&url, self.send(&url, request)?)?;
        Ok(())
    }

    fn list_commands(&self) -> Result<Value, ObsidianError> {
        let url = format!("{}/commands/", self.base_url);
        let response = check_status(&url, self.send(&url, self.client.get(&url))?)?;
        response
            .json()
            .map_err(|source| ObsidianError::Decode { url, source })
    }

    fn execute_command(&self, command_id: &str) -> Result<(), ObsidianError> {
        let url = format!(
            "{}/commands/{}/",
            self.base_url,
            encode_vault_path(command_id)
        );
        debug!("Executing command: {}", command_id);
        check_status(&url, self.send(&url, self.client.post(&url))?)?;
        Ok(())
    }
}

/// Turns a non-success response into [`ObsidianError::Http`].
fn check_status(url: &str, response: Response) -> Result<Response, ObsidianError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(ObsidianError::Http {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        url: url.to_string(),
        details: error_details(&body),
    })
}

/// Parses an error body as JSON, wrapping plain text as `{"error": body}`.
fn error_details(body: &str) -> Value {
    if body.is_empty() {
        return json!({});
    }
    serde_json::from_str(body).unwrap_or_else(|_| json!({ "error": body }))
}

/// Percent-encodes a vault path, keeping `/` separators.
pub fn encode_vault_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}
