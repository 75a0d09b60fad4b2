//! Linear GraphQL API client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value, json};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LINEAR_URL: &str = "https://api.linear.app/graphql";

const VIEWER_QUERY: &str = "query { viewer { id name email } }";

const TEAM_QUERY: &str = r#"
query TeamByKey($key: String!) {
    teams(filter: { key: { eq: $key } }) {
        nodes { id key name }
    }
}"#;

const ISSUES_QUERY: &str = r#"
query Issues($first: Int!, $filter: IssueFilter) {
    issues(first: $first, filter: $filter, orderBy: updatedAt) {
        nodes {
            id
            identifier
            title
            description
            priority
            priorityLabel
            url
            createdAt
            updatedAt
            dueDate
            state { id name type color }
            team { id key name }
            assignee { id name email }
            creator { id name email }
            project { id name url }
            labels { nodes { id name color } }
            comments { nodes { id createdAt body user { name } } }
            parent { id identifier title }
            children { nodes { id identifier title } }
        }
    }
}"#;

/// Errors from the Linear API.
#[derive(Debug, Error)]
pub enum LinearError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Linear API request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Linear GraphQL error: {message}")]
    GraphQl { message: String, errors: Value },

    #[error("failed to parse Linear response: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("team with key \"{0}\" not found")]
    TeamNotFound(String),
}

impl LinearError {
    /// Extra fields for the JSON error payload.
    pub fn details(&self) -> Map<String, Value> {
        let mut map = Map::new();
        match self {
            LinearError::GraphQl { errors, .. } => {
                map.insert("errors".to_string(), errors.clone());
            }
            LinearError::TeamNotFound(key) => {
                map.insert("team_key".to_string(), json!(key));
            }
            _ => {}
        }
        map
    }
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Viewer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Team {
    pub id: String,
    pub key: String,
    pub name: String,
}

/// Issue filters; each set field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
    pub assignee_id: Option<String>,
    /// Exact state type (`started`, `completed`, ...).
    pub state_type: Option<String>,
    /// Without `state_type`, completed and canceled issues are excluded
    /// unless this is set.
    pub include_completed: bool,
    pub updated_after: Option<DateTime<Utc>>,
    pub team_id: Option<String>,
    pub project_id: Option<String>,
    pub limit: u32,
}

impl IssueQuery {
    /// Builds the GraphQL `IssueFilter` input object.
    pub fn filter(&self) -> Option<Value> {
        let mut filter = Map::new();

        if let Some(id) = &self.assignee_id {
            filter.insert("assignee".to_string(), json!({ "id": { "eq": id } }));
        }
        if let Some(state_type) = &self.state_type {
            filter.insert("state".to_string(), json!({ "type": { "eq": state_type } }));
        } else if !self.include_completed {
            filter.insert(
                "state".to_string(),
                json!({ "type": { "nin": ["completed", "canceled"] } }),
            );
        }
        if let Some(after) = &self.updated_after {
            filter.insert(
                "updatedAt".to_string(),
                json!({ "gte": after.format("%Y-%m-%dT%H:%M:%S+00:00").to_string() }),
            );
        }
        if let Some(id) = &self.team_id {
            filter.insert("team".to_string(), json!({ "id": { "eq": id } }));
        }
        if let Some(id) = &self.project_id {
            filter.insert("project".to_string(), json!({ "id": { "eq": id } }));
        }

        (!filter.is_empty()).then_some(Value::Object(filter))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    pub nodes: Vec<T>,
}

/// Issue as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Number,
    pub priority_label: String,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub state: StateNode,
    pub team: TeamNode,
    #[serde(default)]
    pub assignee: Option<UserNode>,
    #[serde(default)]
    pub creator: Option<UserNode>,
    #[serde(default)]
    pub project: Option<ProjectNode>,
    pub labels: Nodes<LabelNode>,
    pub comments: Nodes<CommentNode>,
    #[serde(default)]
    pub parent: Option<IssueRef>,
    pub children: Nodes<IssueRef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateNode {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamNode {
    pub id: String,
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectNode {
    pub id: String,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LabelNode {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Comments keep the API's field names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: String,
    pub created_at: String,
    pub body: String,
    #[serde(default)]
    pub user: Option<CommentUser>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentUser {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssueRef {
    pub id: String,
    pub identifier: String,
    pub title: String,
}

/// Blocking GraphQL client.
pub struct LinearClient {
    client: Client,
    url: String,
    api_key: String,
}

impl LinearClient {
    pub fn new(url: &str, api_key: String, timeout: Duration) -> Result<Self, LinearError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LinearError::Client)?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key,
        })
    }

    /// Runs a query and returns its `data` object.
    pub fn query(&self, query: &str, variables: Value) -> Result<Value, LinearError> {
        debug!("Linear query ({} bytes)", query.len());
        let body: Value = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, &self.api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(LinearError::Http)?;
        extract_data(body)
    }

    pub fn viewer(&self) -> Result<Viewer, LinearError> {
        let data = self.query(VIEWER_QUERY, json!({}))?;
        decode(&data["viewer"])
    }

    pub fn team_by_key(&self, key: &str) -> Result<Team, LinearError> {
        let data = self.query(TEAM_QUERY, json!({ "key": key }))?;
        let teams: Nodes<Team> = decode(&data["teams"])?;
        teams
            .nodes
            .into_iter()
            .next()
            .ok_or_else(|| LinearError::TeamNotFound(key.to_string()))
    }

    pub fn issues(&self, query: &IssueQuery) -> Result<Vec<IssueNode>, LinearError> {
        let variables = json!({ "first": query.limit, "filter": query.filter() });
        let data = self.query(ISSUES_QUERY, variables)?;
        let issues: Nodes<IssueNode> = decode(&data["issues"])?;
        debug!("Fetched {} issues", issues.nodes.len());
        Ok(issues.nodes)
    }
}

/// Splits a GraphQL response into `data` or an error.
fn extract_data(mut body: Value) -> Result<Value, LinearError> {
    if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
        let message = errors
            .get(0)
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(LinearError::GraphQl {
            message,
            errors: errors.clone(),
        });
    }
    Ok(body["data"].take())
}

fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, LinearError> {
    T::deserialize(value).map_err(LinearError::Parse)
}
