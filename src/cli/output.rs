//! Output types for CLI commands.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::infra::linear::{
    CommentNode, IssueRef, LabelNode, ProjectNode, StateNode, TeamNode, UserNode,
};
use crate::infra::{LinearError, ObsidianError, SecretError, SlackError, Viewer};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Error object printed on stderr when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ErrorPayload {
    /// Renders the full context chain as the message and collects
    /// structured details from any known error in the chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let mut details = Map::new();
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<ObsidianError>() {
                details.extend(e.details());
            } else if let Some(e) = cause.downcast_ref::<SlackError>() {
                details.extend(e.details());
            } else if let Some(e) = cause.downcast_ref::<LinearError>() {
                details.extend(e.details());
            } else if let Some(e) = cause.downcast_ref::<SecretError>() {
                details.extend(e.details());
            }
        }
        Self {
            error: format!("{:#}", err),
            details,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| format!("{{\"error\": {:?}}}", self.error))
    }
}

// ===========================================
// Obsidian
// ===========================================

/// Write action reported by note-editing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteAction {
    Created,
    Appended,
    AppendedToSection,
}

#[derive(Debug, Serialize)]
pub struct NoteContent {
    pub success: bool,
    pub path: String,
    pub content: String,
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct NoteExists {
    pub success: bool,
    pub path: String,
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct NoteCreated {
    pub success: bool,
    pub path: String,
    pub action: NoteAction,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct NoteAppended {
    pub success: bool,
    pub path: String,
    pub action: NoteAction,
    pub appended_content: String,
}

#[derive(Debug, Serialize)]
pub struct SectionAppended {
    pub success: bool,
    pub path: String,
    pub action: NoteAction,
    pub section: String,
    pub section_found: bool,
    pub appended_content: String,
}

#[derive(Debug, Serialize)]
pub struct CommandList {
    pub success: bool,
    pub commands: Value,
}

#[derive(Debug, Serialize)]
pub struct CommandExecuted {
    pub success: bool,
    pub command_id: String,
    pub executed: bool,
}

// ===========================================
// Slack
// ===========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionEntry {
    pub channel_id: String,
    pub channel_name: String,
    pub timestamp: String,
    pub user: String,
    pub text: String,
    pub thread_ts: Option<String>,
    pub permalink: String,
}

#[derive(Debug, Serialize)]
pub struct MentionsReport {
    pub mode: &'static str,
    pub since_hours: u32,
    pub user_id: String,
    pub priority_dm_count: usize,
    pub other_mention_count: usize,
    pub priority_dms: Vec<MentionEntry>,
    pub other_mentions: Vec<MentionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityActivity {
    pub user: String,
    pub message_count: usize,
    pub channel_id: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityReport {
    pub mode: &'static str,
    pub since_hours: u32,
    pub user_id: String,
    pub total_messages: usize,
    pub priority_dms: Vec<PriorityActivity>,
    pub channel_activity: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestMessage {
    pub timestamp: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DmSummary {
    pub user: String,
    pub user_id: Option<String>,
    pub channel_id: String,
    pub message_count: usize,
    pub is_priority: bool,
    pub latest_message: Option<LatestMessage>,
}

/// Look-back window; zero hours renders as `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SinceHours {
    Hours(u32),
    All(&'static str),
}

impl From<u32> for SinceHours {
    fn from(hours: u32) -> Self {
        if hours == 0 {
            SinceHours::All("all")
        } else {
            SinceHours::Hours(hours)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DmsReport {
    pub mode: &'static str,
    pub since_hours: SinceHours,
    pub user_id: String,
    pub dm_count: usize,
    pub dms: Vec<DmSummary>,
}

// ===========================================
// Linear
// ===========================================

#[derive(Debug, Clone, Serialize)]
pub struct IssueSummary {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub description: String,
    pub priority: serde_json::Number,
    pub priority_label: String,
    pub url: String,
    pub created_at: String,
    pub updated_at: String,
    pub due_date: Option<String>,
    pub state: StateNode,
    pub team: TeamNode,
    pub assignee: Option<UserNode>,
    pub creator: Option<UserNode>,
    pub project: Option<ProjectNode>,
    pub labels: Vec<LabelNode>,
    pub comment_count: usize,
    pub latest_comment: Option<CommentNode>,
    pub parent: Option<IssueRef>,
    pub child_count: usize,
    pub children: Vec<IssueRef>,
}

#[derive(Debug, Serialize)]
pub struct IssuesReport {
    pub viewer: Viewer,
    pub count: usize,
    pub mode: &'static str,
    pub issues: Vec<IssueSummary>,
}

// ===========================================
// Countdown
// ===========================================

#[derive(Debug, Serialize)]
pub struct CountdownEntry {
    pub name: String,
    pub date: NaiveDate,
    pub year: i32,
    pub days: i64,
    pub is_today: bool,
}

#[derive(Debug, Serialize)]
pub struct CountdownReport {
    pub today: NaiveDate,
    pub countdowns: Vec<CountdownEntry>,
}
