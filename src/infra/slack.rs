//! Slack Web API client.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_SLACK_URL: &str = "https://slack.com/api";

/// Wait applied when a rate-limited response carries no `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 10;

/// Errors from the Slack Web API.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP request to {method} failed: {source}")]
    Http {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Slack API error on {method}: {error}")]
    Api {
        method: String,
        error: String,
        http_status: u16,
        response_body: Value,
    },

    #[error("Slack API rate limited {method} (retry after {retry_after}s)")]
    RateLimited { method: String, retry_after: u64 },

    #[error("failed to parse {method} response: {source}")]
    Parse {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SlackError {
    /// Extra fields for the JSON error payload.
    pub fn details(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            SlackError::Client(_) => {}
            SlackError::Http { method, .. } | SlackError::Parse { method, .. } => {
                map.insert("method".to_string(), json!(method));
            }
            SlackError::Api {
                method,
                http_status,
                response_body,
                ..
            } => {
                map.insert("method".to_string(), json!(method));
                map.insert("http_status".to_string(), json!(http_status));
                map.insert("response_body".to_string(), response_body.clone());
            }
            SlackError::RateLimited {
                method,
                retry_after,
            } => {
                map.insert("method".to_string(), json!(method));
                map.insert("retry_after".to_string(), json!(retry_after));
            }
        }
        map
    }
}

/// A workspace member from `users.list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A channel, group, or DM from `conversations.list`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    /// The other member of a DM.
    #[serde(default)]
    pub user: Option<String>,
}

impl Conversation {
    /// Display name for a non-DM conversation.
    pub fn display_name(&self) -> &str {
        if self.is_im {
            "DM"
        } else if self.is_mpim {
            self.name.as_deref().unwrap_or("Group DM")
        } else {
            self.name.as_deref().unwrap_or(&self.id)
        }
    }
}

/// A message from `conversations.history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

/// A hit from `search.messages`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchMatch {
    #[serde(default)]
    pub channel: Option<SearchChannel>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchChannel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_im: bool,
}

/// Blocking Slack Web API client.
pub struct SlackClient {
    client: Client,
    base_url: String,
    token: String,
}

impl SlackClient {
    pub fn new(base_url: &str, token: String, timeout: Duration) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SlackError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Calls a Web API method with form-encoded parameters.
    ///
    /// A rate-limited call is retried once after the server's `Retry-After`.
    pub fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value, SlackError> {
        match self.call_once(method, params) {
            Err(SlackError::RateLimited { retry_after, .. }) => {
                warn!(method, retry_after, "rate limited, retrying once");
                thread::sleep(Duration::from_secs(retry_after));
                self.call_once(method, params)
            }
            other => other,
        }
    }

    fn call_once(&self, method: &str, params: &[(&str, String)]) -> Result<Value, SlackError> {
        let url = format!("{}/{}", self.base_url, method);
        debug!("Calling Slack method: {}", method);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .form(params)
            .send()
            .map_err(|source| SlackError::Http {
                method: method.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let bytes = response.bytes().map_err(|source| SlackError::Http {
            method: method.to_string(),
            source,
        })?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|source| SlackError::Parse {
            method: method.to_string(),
            source,
        })?;

        interpret_response(method, status, retry_after, body)
    }

    /// Raw `auth.test` response.
    pub fn auth_test(&self) -> Result<Value, SlackError> {
        self.call("auth.test", &[])
    }

    /// ID of the user the token belongs to.
    pub fn own_user_id(&self) -> Result<String, SlackError> {
        let data = self.auth_test()?;
        let user_id: String = field("auth.test", &data, "user_id")?;
        info!("Authenticated as Slack user {}", user_id);
        Ok(user_id)
    }

    pub fn users(&self) -> Result<Vec<SlackUser>, SlackError> {
        self.paginate("users.list", &[], "members", 200)
    }

    /// Lists non-archived conversations of the given comma-separated types.
    pub fn conversations(&self, types: &str) -> Result<Vec<Conversation>, SlackError> {
        self.paginate(
            "conversations.list",
            &[
                ("types", types.to_string()),
                ("exclude_archived", "true".to_string()),
            ],
            "channels",
            200,
        )
    }

    /// Messages in a conversation, newest first. `oldest` is a Unix
    /// timestamp string.
    pub fn history(
        &self,
        channel_id: &str,
        oldest: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Message>, SlackError> {
        let mut params = vec![
            ("channel", channel_id.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(oldest) = oldest {
            params.push(("oldest", oldest.to_string()));
        }
        let data = self.call("conversations.history", &params)?;
        optional_field("conversations.history", &data, "messages")
    }

    pub fn search_messages(&self, query: &str, count: u32) -> Result<Vec<SearchMatch>, SlackError> {
        let data = self.call(
            "search.messages",
            &[("query", query.to_string()), ("count", count.to_string())],
        )?;
        let matches = data
            .get("messages")
            .and_then(|m| m.get("matches"))
            .cloned()
            .unwrap_or_else(|| json!([]));
        serde_json::from_value(matches).map_err(|source| SlackError::Parse {
            method: "search.messages".to_string(),
            source,
        })
    }

    /// Follows `response_metadata.next_cursor` until exhausted.
    fn paginate<T: DeserializeOwned>(
        &self,
        method: &str,
        base: &[(&str, String)],
        key: &str,
        limit: u32,
    ) -> Result<Vec<T>, SlackError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut params = base.to_vec();
            params.push(("limit", limit.to_string()));
            if let Some(cursor) = &cursor {
                params.push(("cursor", cursor.clone()));
            }

            let data = self.call(method, &params)?;
            let mut page: Vec<T> = optional_field(method, &data, key)?;
            items.append(&mut page);

            cursor = next_cursor(&data);
            if cursor.is_none() {
                break;
            }
        }

        debug!("{} returned {} items", method, items.len());
        Ok(items)
    }
}

/// Maps a decoded Web API body to success or a typed error.
fn interpret_response(
    method: &str,
    http_status: u16,
    retry_after: Option<u64>,
    body: Value,
) -> Result<Value, SlackError> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(body);
    }

    let error = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error")
        .to_string();

    if error == "ratelimited" {
        return Err(SlackError::RateLimited {
            method: method.to_string(),
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        });
    }

    Err(SlackError::Api {
        method: method.to_string(),
        error,
        http_status,
        response_body: body,
    })
}

fn next_cursor(data: &Value) -> Option<String> {
    data.get("response_metadata")
        .and_then(|m| m.get("next_cursor"))
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

fn field<T: DeserializeOwned>(method: &str, data: &Value, key: &str) -> Result<T, SlackError> {
    T::deserialize(data.get(key).unwrap_or(&Value::Null)).map_err(|source| SlackError::Parse {
        method: method.to_string(),
        source,
    })
}

/// Like [`field`], but a missing key yields the default.
fn optional_field<T: DeserializeOwned + Default>(
    method: &str,
    data: &Value,
    key: &str,
) -> Result<T, SlackError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(_) => field(method, data, key),
    }
}
