//! Linear command handlers.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::cli::LinearCommand;
use crate::cli::config::Config;
use crate::cli::output::{IssueSummary, IssuesReport, print_json};
use crate::infra::{IssueNode, IssueQuery, LinearClient, Viewer};

pub fn handle_linear(command: &LinearCommand, config: &Config) -> Result<()> {
    let api_key = config.linear.api_key.resolve("Linear API key")?;
    let client = LinearClient::new(&config.linear.url, api_key, config.timeout())?;
    let viewer = client.viewer().context("failed to fetch Linear viewer")?;

    let now = Utc::now();
    let (mode, query) = match command {
        LinearCommand::Me => return print_json(&viewer),
        LinearCommand::Active { limit } => ("active", active_query(&viewer, *limit)),
        LinearCommand::UpdatedToday { limit } => (
            "updated_today",
            IssueQuery {
                assignee_id: Some(viewer.id.clone()),
                include_completed: true,
                updated_after: Some(start_of_day(now)),
                limit: *limit,
                ..IssueQuery::default()
            },
        ),
        LinearCommand::CompletedThisWeek { limit } => (
            "completed_this_week",
            IssueQuery {
                assignee_id: Some(viewer.id.clone()),
                state_type: Some("completed".to_string()),
                updated_after: Some(start_of_week(now)),
                limit: *limit,
                ..IssueQuery::default()
            },
        ),
        LinearCommand::Team { key, limit } => {
            let team = client
                .team_by_key(key)
                .with_context(|| format!("failed to resolve team '{}'", key))?;
            (
                "team",
                IssueQuery {
                    team_id: Some(team.id),
                    ..active_query(&viewer, *limit)
                },
            )
        }
    };

    let issues = client
        .issues(&query)
        .with_context(|| format!("failed to fetch {} issues", mode))?;
    print_json(&issues_report(viewer, mode, issues))
}

fn active_query(viewer: &Viewer, limit: u32) -> IssueQuery {
    IssueQuery {
        assignee_id: Some(viewer.id.clone()),
        limit,
        ..IssueQuery::default()
    }
}

pub(crate) fn issues_report(
    viewer: Viewer,
    mode: &'static str,
    issues: Vec<IssueNode>,
) -> IssuesReport {
    let issues: Vec<IssueSummary> = issues.into_iter().map(summarize_issue).collect();
    IssuesReport {
        viewer,
        count: issues.len(),
        mode,
        issues,
    }
}

/// Flattens an API issue into the reported shape.
pub(crate) fn summarize_issue(issue: IssueNode) -> IssueSummary {
    let comment_count = issue.comments.nodes.len();
    let latest_comment = issue.comments.nodes.into_iter().last();
    let children = issue.children.nodes;

    IssueSummary {
        id: issue.id,
        identifier: issue.identifier,
        title: issue.title,
        description: issue.description.unwrap_or_default(),
        priority: issue.priority,
        priority_label: issue.priority_label,
        url: issue.url,
        created_at: issue.created_at,
        updated_at: issue.updated_at,
        due_date: issue.due_date,
        state: issue.state,
        team: issue.team,
        assignee: issue.assignee,
        creator: issue.creator,
        project: issue.project,
        labels: issue.labels.nodes,
        comment_count,
        latest_comment,
        parent: issue.parent,
        child_count: children.len(),
        children,
    }
}

/// Midnight UTC of the given instant's day.
pub(crate) fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Midnight UTC of the Monday starting the given instant's week.
pub(crate) fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_monday = i64::from(now.weekday().num_days_from_monday());
    start_of_day(now) - Duration::days(days_since_monday)
}
