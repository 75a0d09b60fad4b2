//! Slack message text cleanup and user name resolution.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use chrono::DateTime;
use regex::{Captures, Regex};

static USER_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<@([A-Z0-9]+)(?:\|[^>]+)?>").expect("valid pattern"));
static CHANNEL_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<#[A-Z0-9]+\|([^>]+)>").expect("valid pattern"));
static LABELED_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<https?://[^|>]+\|([^>]+)>").expect("valid pattern"));
static BARE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(https?://[^>]+)>").expect("valid pattern"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid pattern"));

/// Name/ID lookup table for the users of one workspace.
///
/// Built once per invocation from a fetched user list and passed to whatever
/// needs it. Each user is registered under their real name and, if set,
/// their display name.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    ids_by_name: HashMap<String, String>,
    names_by_id: HashMap<String, String>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` for `user_id`. Empty names are ignored.
    ///
    /// The first name registered for an ID is the one [`Self::name_for`]
    /// returns.
    pub fn insert(&mut self, name: &str, user_id: &str) {
        if name.is_empty() {
            return;
        }
        self.ids_by_name
            .insert(name.to_string(), user_id.to_string());
        self.names_by_id
            .entry(user_id.to_string())
            .or_insert_with(|| name.to_string());
    }

    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.ids_by_name.get(name).map(String::as_str)
    }

    pub fn name_for(&self, user_id: &str) -> Option<&str> {
        self.names_by_id.get(user_id).map(String::as_str)
    }

    /// Returns the user's name, falling back to the raw ID.
    pub fn display<'a>(&'a self, user_id: &'a str) -> &'a str {
        self.name_for(user_id).unwrap_or(user_id)
    }

    pub fn len(&self) -> usize {
        self.ids_by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids_by_name.is_empty()
    }
}

/// User IDs whose direct messages are surfaced ahead of everything else.
#[derive(Debug, Clone, Default)]
pub struct PriorityUsers(HashSet<String>);

impl PriorityUsers {
    /// Resolves configured names through the directory. Unknown names are
    /// dropped.
    pub fn resolve<S: AsRef<str>>(names: &[S], directory: &UserDirectory) -> Self {
        Self(
            names
                .iter()
                .filter_map(|name| directory.id_for(name.as_ref()))
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn contains(&self, user_id: Option<&str>) -> bool {
        user_id.is_some_and(|id| self.0.contains(id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Strips Slack markup from message text and resolves user mentions to names.
pub fn clean_slack_text(text: &str, directory: &UserDirectory) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = USER_MENTION_RE.replace_all(text, |caps: &Captures<'_>| {
        format!("@{}", directory.display(&caps[1]))
    });
    let text = CHANNEL_MENTION_RE.replace_all(&text, "#$1");
    let text = LABELED_LINK_RE.replace_all(&text, "$1");
    let text = BARE_LINK_RE.replace_all(&text, "$1");
    let text = BOLD_RE.replace_all(&text, "$1");
    text.into_owned()
}

/// Renders a Slack `ts` value (`"1700000000.123456"`) as an RFC 3339 UTC
/// timestamp. Input that is not a Slack timestamp is returned unchanged.
pub fn format_slack_timestamp(ts: &str) -> String {
    parse_slack_timestamp(ts).unwrap_or_else(|| ts.to_string())
}

fn parse_slack_timestamp(ts: &str) -> Option<String> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    let secs: i64 = secs.parse().ok()?;
    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let micros: u32 = format!("{:0<6}", frac).get(..6)?.parse().ok()?;
    let dt = DateTime::from_timestamp(secs, micros * 1_000)?;

    let rendered = if micros == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S+00:00")
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00")
    };
    Some(rendered.to_string())
}

/// Deep link used when the API does not return a permalink.
pub fn fallback_permalink(channel_id: &str, ts: &str) -> String {
    format!(
        "slack://channel?id={}&message={}",
        channel_id,
        ts.replace('.', "")
    )
}
