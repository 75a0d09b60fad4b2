//! Slack command handlers.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::cli::SlackCommand;
use crate::cli::config::Config;
use crate::cli::output::{
    ActivityReport, DmSummary, DmsReport, LatestMessage, MentionEntry, MentionsReport,
    PriorityActivity, print_json,
};
use crate::domain::{
    PriorityUsers, UserDirectory, clean_slack_text, fallback_permalink, format_slack_timestamp,
};
use crate::infra::SlackClient;
use crate::infra::slack::{Conversation, Message, SearchMatch, SlackUser};

const ALL_CONVERSATION_TYPES: &str = "public_channel,private_channel,mpim,im";
const HISTORY_LIMIT: u32 = 100;
const SEARCH_COUNT: u32 = 100;
const PREVIEW_CHARS: usize = 100;

pub fn handle_slack(command: &SlackCommand, config: &Config) -> Result<()> {
    let token = config.slack.token.resolve("Slack token")?;
    let client = SlackClient::new(&config.slack.url, token, config.timeout())?;

    if let SlackCommand::Test = command {
        return print_json(&client.auth_test().context("Slack auth test failed")?);
    }

    let user_id = client
        .own_user_id()
        .context("failed to identify Slack user")?;
    let users = client.users().context("failed to list Slack users")?;
    let directory = build_directory(&users);
    let priority = PriorityUsers::resolve(&config.slack.priority_users, &directory);
    info!(
        users = directory.len(),
        priority = priority.len(),
        "loaded Slack user directory"
    );

    let now = Utc::now();
    match command {
        SlackCommand::Test => Ok(()),
        SlackCommand::Mentions { hours } => {
            let query = mention_query(&user_id, now, *hours);
            let matches = client
                .search_messages(&query, SEARCH_COUNT)
                .context("failed to search Slack mentions")?;
            print_json(&mentions_report(
                &user_id, *hours, matches, &directory, &priority,
            ))
        }
        SlackCommand::Activity { hours } => {
            let oldest = oldest_ts(now, *hours);
            let histories =
                fetch_histories(&client, ALL_CONVERSATION_TYPES, oldest.as_deref())?;
            print_json(&activity_report(
                &user_id, *hours, &histories, &directory, &priority,
            ))
        }
        SlackCommand::Dms { hours } => {
            let oldest = if *hours > 0 {
                oldest_ts(now, *hours)
            } else {
                None
            };
            let histories = fetch_histories(&client, "im", oldest.as_deref())?;
            let dms = dm_summaries(&histories, &directory, &priority);
            print_json(&DmsReport {
                mode: "dms",
                since_hours: (*hours).into(),
                user_id,
                dm_count: dms.len(),
                dms,
            })
        }
    }
}

fn fetch_histories(
    client: &SlackClient,
    types: &str,
    oldest: Option<&str>,
) -> Result<Vec<(Conversation, Vec<Message>)>> {
    let conversations = client
        .conversations(types)
        .context("failed to list Slack conversations")?;
    conversations
        .into_iter()
        .map(|conv| {
            let messages = client
                .history(&conv.id, oldest, HISTORY_LIMIT)
                .with_context(|| format!("failed to read history of {}", conv.id))?;
            Ok((conv, messages))
        })
        .collect()
}

/// Indexes live users by real name and display name.
pub(crate) fn build_directory(users: &[SlackUser]) -> UserDirectory {
    let mut directory = UserDirectory::new();
    for user in users.iter().filter(|u| !u.deleted) {
        if let Some(real_name) = &user.real_name {
            directory.insert(real_name, &user.id);
        }
        if let Some(display_name) = &user.profile.display_name {
            directory.insert(display_name, &user.id);
        }
    }
    directory
}

/// Search query for mentions of `user_id` since `hours` ago (UTC date).
pub(crate) fn mention_query(user_id: &str, now: DateTime<Utc>, hours: u32) -> String {
    let since = now - Duration::hours(i64::from(hours));
    format!("<@{}> after:{}", user_id, since.format("%Y-%m-%d"))
}

fn oldest_ts(now: DateTime<Utc>, hours: u32) -> Option<String> {
    let since = now - Duration::hours(i64::from(hours));
    Some(since.timestamp().to_string())
}

pub(crate) fn mentions_report(
    user_id: &str,
    hours: u32,
    matches: Vec<SearchMatch>,
    directory: &UserDirectory,
    priority: &PriorityUsers,
) -> MentionsReport {
    let mut priority_dms = Vec::new();
    let mut other_mentions = Vec::new();

    for hit in matches {
        let channel = hit.channel.unwrap_or_default();
        let Some(channel_id) = channel.id else {
            continue;
        };

        let sender = hit
            .user
            .as_deref()
            .map_or("Unknown", |id| directory.display(id))
            .to_string();
        let ts = hit.ts.unwrap_or_default();
        let channel_name = if channel.is_im {
            sender.clone()
        } else {
            format!("#{}", channel.name.as_deref().unwrap_or(&channel_id))
        };

        let entry = MentionEntry {
            permalink: hit
                .permalink
                .unwrap_or_else(|| fallback_permalink(&channel_id, &ts)),
            channel_id,
            channel_name,
            timestamp: format_slack_timestamp(&ts),
            user: sender,
            text: clean_slack_text(hit.text.as_deref().unwrap_or_default(), directory),
            thread_ts: hit.thread_ts,
        };

        if channel.is_im && priority.contains(hit.user.as_deref()) {
            priority_dms.push(entry);
        } else {
            other_mentions.push(entry);
        }
    }

    MentionsReport {
        mode: "mentions",
        since_hours: hours,
        user_id: user_id.to_string(),
        priority_dm_count: priority_dms.len(),
        other_mention_count: other_mentions.len(),
        priority_dms,
        other_mentions,
    }
}

pub(crate) fn activity_report(
    user_id: &str,
    hours: u32,
    histories: &[(Conversation, Vec<Message>)],
    directory: &UserDirectory,
    priority: &PriorityUsers,
) -> ActivityReport {
    let mut priority_dms = Vec::new();
    let mut channel_activity = BTreeMap::new();

    for (conv, messages) in histories {
        let count = messages
            .iter()
            .filter(|m| m.user.as_deref() == Some(user_id))
            .count();
        if count == 0 {
            continue;
        }

        if conv.is_im {
            let dm_user = dm_user_name(conv, directory);
            if priority.contains(conv.user.as_deref()) {
                priority_dms.push(PriorityActivity {
                    user: dm_user,
                    message_count: count,
                    channel_id: conv.id.clone(),
                });
            } else {
                channel_activity.insert(format!("DM: {}", dm_user), count);
            }
        } else {
            channel_activity.insert(format!("#{}", conv.display_name()), count);
        }
    }

    let total_messages = channel_activity.values().sum::<usize>()
        + priority_dms.iter().map(|dm| dm.message_count).sum::<usize>();

    ActivityReport {
        mode: "activity",
        since_hours: hours,
        user_id: user_id.to_string(),
        total_messages,
        priority_dms,
        channel_activity,
    }
}

/// Summarizes DMs that have history, priority users first, then busiest.
pub(crate) fn dm_summaries(
    histories: &[(Conversation, Vec<Message>)],
    directory: &UserDirectory,
    priority: &PriorityUsers,
) -> Vec<DmSummary> {
    let mut dms: Vec<DmSummary> = histories
        .iter()
        .filter(|(_, messages)| !messages.is_empty())
        .map(|(conv, messages)| DmSummary {
            user: dm_user_name(conv, directory),
            user_id: conv.user.clone(),
            channel_id: conv.id.clone(),
            message_count: messages.len(),
            is_priority: priority.contains(conv.user.as_deref()),
            latest_message: messages.first().map(|latest| LatestMessage {
                timestamp: format_slack_timestamp(latest.ts.as_deref().unwrap_or_default()),
                text: latest
                    .text
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(PREVIEW_CHARS)
                    .collect(),
            }),
        })
        .collect();

    dms.sort_by_key(|dm| (!dm.is_priority, std::cmp::Reverse(dm.message_count)));
    dms
}

fn dm_user_name(conv: &Conversation, directory: &UserDirectory) -> String {
    conv.user
        .as_deref()
        .map_or("Unknown", |id| directory.display(id))
        .to_string()
}
