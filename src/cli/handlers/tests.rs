use super::linear::{issues_report, start_of_day, start_of_week, summarize_issue};
use super::obsidian::{
    Appended, append_note, append_to_section, create_note, execute_command, list_commands,
    note_exists, read_note, run_obsidian,
};
use super::slack::{activity_report, build_directory, dm_summaries, mention_query, mentions_report};
use crate::cli::ObsidianCommand;
use crate::cli::output::NoteAction;
use crate::domain::{PriorityUsers, UserDirectory};
use crate::infra::linear::IssueNode;
use crate::infra::obsidian::RELOAD_COMMAND;
use crate::infra::slack::{Conversation, Message, SearchChannel, SearchMatch, SlackUser, UserProfile};
use crate::infra::{ObsidianError, Vault, Viewer};
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;

// ===========================================
// In-memory vault
// ===========================================

#[derive(Default)]
struct FakeVault {
    notes: RefCell<HashMap<String, String>>,
    executed: RefCell<Vec<String>>,
    fail_reads: bool,
    fail_writes: bool,
    fail_commands: bool,
}

fn server_error(path: &str) -> ObsidianError {
    ObsidianError::Http {
        status: 500,
        reason: "Internal Server Error".to_string(),
        url: format!("https://127.0.0.1:27124/vault/{}", path),
        details: Value::Null,
    }
}

impl FakeVault {
    fn with_note(path: &str, content: &str) -> Self {
        let vault = Self::default();
        vault
            .notes
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        vault
    }

    fn note(&self, path: &str) -> Option<String> {
        self.notes.borrow().get(path).cloned()
    }

    fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl Vault for FakeVault {
    fn read(&self, path: &str) -> Result<Option<String>, ObsidianError> {
        if self.fail_reads {
            return Err(server_error(path));
        }
        Ok(self.note(path))
    }

    fn write(&self, path: &str, content: &str) -> Result<(), ObsidianError> {
        if self.fail_writes {
            return Err(server_error(path));
        }
        self.notes
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn list_commands(&self) -> Result<Value, ObsidianError> {
        Ok(json!({"commands": [{"id": RELOAD_COMMAND, "name": "Reload app without saving"}]}))
    }

    fn execute_command(&self, command_id: &str) -> Result<(), ObsidianError> {
        if self.fail_commands {
            return Err(ObsidianError::Http {
                status: 404,
                reason: "Not Found".to_string(),
                url: format!("https://127.0.0.1:27124/commands/{}/", command_id),
                details: Value::Null,
            });
        }
        self.executed.borrow_mut().push(command_id.to_string());
        Ok(())
    }
}

// ===========================================
// Obsidian handlers
// ===========================================

#[test]
fn read_existing_note() {
    let vault = FakeVault::with_note("Daily/2025-11-03.md", "# Today\n");
    let result = read_note(&vault, "Daily/2025-11-03.md").unwrap();
    assert!(result.exists);
    assert_eq!(result.content, "# Today\n");
}

#[test]
fn read_missing_note_is_an_error() {
    let vault = FakeVault::default();
    let err = read_note(&vault, "nope.md").unwrap_err();
    assert_eq!(err.to_string(), "note not found: 'nope.md'");
}

#[test]
fn exists_reports_both_cases() {
    let vault = FakeVault::with_note("a.md", "");
    assert!(note_exists(&vault, "a.md").unwrap().exists);
    assert!(!note_exists(&vault, "b.md").unwrap().exists);
}

#[test]
fn create_overwrites() {
    let vault = FakeVault::with_note("a.md", "old");
    let result = create_note(&vault, "a.md", "new").unwrap();
    assert_eq!(result.action, NoteAction::Created);
    assert_eq!(vault.note("a.md").as_deref(), Some("new"));
}

#[test]
fn append_joins_with_newline() {
    let vault = FakeVault::with_note("a.md", "line one");
    match append_note(&vault, "a.md", "line two").unwrap() {
        Appended::Existing(result) => {
            assert_eq!(result.action, NoteAction::Appended);
            assert_eq!(result.appended_content, "line two");
        }
        other => panic!("expected append, got {:?}", other),
    }
    assert_eq!(vault.note("a.md").as_deref(), Some("line one\nline two"));
}

#[test]
fn append_to_missing_note_creates_it() {
    let vault = FakeVault::default();
    match append_note(&vault, "new.md", "first").unwrap() {
        Appended::Created(result) => assert_eq!(result.content, "first"),
        other => panic!("expected create, got {:?}", other),
    }
    assert_eq!(vault.note("new.md").as_deref(), Some("first"));
}

#[test]
fn append_section_inserts_before_next_sibling() {
    let vault = FakeVault::with_note(
        "Daily.md",
        "# Daily\n## Tasks\n- [ ] a\n\n## Notes\nn",
    );
    let result = append_to_section(&vault, "Daily.md", "## Tasks", "- [ ] b").unwrap();
    assert!(result.section_found);
    assert_eq!(result.action, NoteAction::AppendedToSection);
    assert_eq!(result.section, "## Tasks");
    assert_eq!(
        vault.note("Daily.md").as_deref(),
        Some("# Daily\n## Tasks\n- [ ] a\n\n- [ ] b\n## Notes\nn")
    );
}

#[test]
fn append_section_adds_missing_section() {
    let vault = FakeVault::with_note("Daily.md", "# Daily");
    let result = append_to_section(&vault, "Daily.md", "Log", "entry").unwrap();
    assert!(!result.section_found);
    assert_eq!(
        vault.note("Daily.md").as_deref(),
        Some("# Daily\n\nLog\n\nentry")
    );
}

#[test]
fn append_section_on_missing_note_starts_empty() {
    let vault = FakeVault::default();
    let result = append_to_section(&vault, "Fresh.md", "## Tasks", "- [ ] a").unwrap();
    assert!(!result.section_found);
    assert_eq!(
        vault.note("Fresh.md").as_deref(),
        Some("\n## Tasks\n\n- [ ] a")
    );
}

#[test]
fn writes_trigger_reload() {
    let vault = FakeVault::default();
    let command = ObsidianCommand::Create {
        path: "a.md".to_string(),
        content: "x".to_string(),
    };
    run_obsidian(&command, &vault, true).unwrap();
    assert_eq!(vault.executed(), vec![RELOAD_COMMAND.to_string()]);
}

#[test]
fn reload_can_be_disabled() {
    let vault = FakeVault::default();
    let command = ObsidianCommand::Append {
        path: "a.md".to_string(),
        content: "x".to_string(),
    };
    run_obsidian(&command, &vault, false).unwrap();
    assert!(vault.executed().is_empty());
}

#[test]
fn reads_do_not_reload() {
    let vault = FakeVault::with_note("a.md", "x");
    let command = ObsidianCommand::Exists {
        path: "a.md".to_string(),
    };
    run_obsidian(&command, &vault, true).unwrap();
    assert!(vault.executed().is_empty());
}

#[test]
fn failed_reload_does_not_fail_the_write() {
    let vault = FakeVault {
        fail_commands: true,
        ..FakeVault::default()
    };
    let command = ObsidianCommand::AppendSection {
        path: "a.md".to_string(),
        header: "## Tasks".to_string(),
        content: "- x".to_string(),
    };
    run_obsidian(&command, &vault, true).unwrap();
    assert!(vault.note("a.md").is_some());
}

#[test]
fn failed_read_stops_append_section_before_writing() {
    let vault = FakeVault {
        fail_reads: true,
        ..FakeVault::with_note("a.md", "# A")
    };
    let err = append_to_section(&vault, "a.md", "## T", "c").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "failed to read note 'a.md': HTTP 500: Internal Server Error"
    );
    assert_eq!(vault.note("a.md").as_deref(), Some("# A"));
}

#[test]
fn failed_read_stops_append_before_writing() {
    let vault = FakeVault {
        fail_reads: true,
        ..FakeVault::default()
    };
    let err = append_note(&vault, "new.md", "c").unwrap_err();
    assert!(err.to_string().starts_with("failed to read note 'new.md'"));
    assert!(vault.note("new.md").is_none());
}

#[test]
fn failed_write_is_an_error_and_skips_reload() {
    for command in [
        ObsidianCommand::Create {
            path: "a.md".to_string(),
            content: "x".to_string(),
        },
        ObsidianCommand::Append {
            path: "a.md".to_string(),
            content: "x".to_string(),
        },
        ObsidianCommand::AppendSection {
            path: "a.md".to_string(),
            header: "## T".to_string(),
            content: "x".to_string(),
        },
    ] {
        let vault = FakeVault {
            fail_writes: true,
            ..FakeVault::with_note("a.md", "# A")
        };
        let err = run_obsidian(&command, &vault, true).unwrap_err();
        assert_eq!(
            format!("{:#}", err),
            "failed to write note 'a.md': HTTP 500: Internal Server Error"
        );
        assert_eq!(vault.note("a.md").as_deref(), Some("# A"));
        assert!(vault.executed().is_empty());
    }
}

#[test]
fn execute_command_reports_id() {
    let vault = FakeVault::default();
    let result = execute_command(&vault, "editor:save-file").unwrap();
    assert!(result.executed);
    assert_eq!(result.command_id, "editor:save-file");
    assert_eq!(vault.executed(), vec!["editor:save-file".to_string()]);
}

#[test]
fn execute_command_failure_has_context() {
    let vault = FakeVault {
        fail_commands: true,
        ..FakeVault::default()
    };
    let err = execute_command(&vault, "bogus").unwrap_err();
    assert_eq!(
        format!("{:#}", err),
        "failed to execute command 'bogus': HTTP 404: Not Found"
    );
}

#[test]
fn list_commands_passes_through() {
    let vault = FakeVault::default();
    let result = list_commands(&vault).unwrap();
    assert_eq!(result.commands["commands"][0]["id"], RELOAD_COMMAND);
}

// ===========================================
// Slack reshaping
// ===========================================

fn user(id: &str, real_name: &str, display_name: &str) -> SlackUser {
    SlackUser {
        id: id.to_string(),
        deleted: false,
        real_name: Some(real_name.to_string()),
        profile: UserProfile {
            display_name: Some(display_name.to_string()),
        },
    }
}

fn directory() -> UserDirectory {
    build_directory(&[
        user("U1", "Ada Lovelace", "ada"),
        user("U2", "Grace Hopper", "grace"),
        user("ME", "Me Myself", "me"),
    ])
}

fn priority(dir: &UserDirectory) -> PriorityUsers {
    PriorityUsers::resolve(&["Ada Lovelace"], dir)
}

fn message(user: &str, ts: &str, text: &str) -> Message {
    Message {
        ts: Some(ts.to_string()),
        user: Some(user.to_string()),
        text: Some(text.to_string()),
        thread_ts: None,
    }
}

fn dm(id: &str, user: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        is_im: true,
        user: Some(user.to_string()),
        ..Conversation::default()
    }
}

fn channel(id: &str, name: &str) -> Conversation {
    Conversation {
        id: id.to_string(),
        name: Some(name.to_string()),
        ..Conversation::default()
    }
}

#[test]
fn directory_skips_deleted_users() {
    let mut gone = user("U9", "Old Timer", "old");
    gone.deleted = true;
    let dir = build_directory(&[user("U1", "Ada Lovelace", "ada"), gone]);
    assert_eq!(dir.id_for("ada"), Some("U1"));
    assert_eq!(dir.name_for("U1"), Some("Ada Lovelace"));
    assert_eq!(dir.id_for("Old Timer"), None);
}

#[test]
fn mention_query_uses_utc_date() {
    let now = Utc.with_ymd_and_hms(2025, 11, 3, 6, 0, 0).unwrap();
    assert_eq!(mention_query("ME", now, 24), "<@ME> after:2025-11-02");
    assert_eq!(mention_query("ME", now, 1), "<@ME> after:2025-11-03");
}

#[test]
fn mentions_split_priority_dms() {
    let dir = directory();
    let matches = vec![
        SearchMatch {
            channel: Some(SearchChannel {
                id: Some("D1".to_string()),
                name: None,
                is_im: true,
            }),
            ts: Some("1700000000.000100".to_string()),
            user: Some("U1".to_string()),
            text: Some("hey <@ME> see *this*".to_string()),
            thread_ts: None,
            permalink: None,
        },
        SearchMatch {
            channel: Some(SearchChannel {
                id: Some("C1".to_string()),
                name: Some("general".to_string()),
                is_im: false,
            }),
            ts: Some("1700000000.000000".to_string()),
            user: Some("U2".to_string()),
            text: Some("<@ME> ping".to_string()),
            thread_ts: Some("1699999999.000000".to_string()),
            permalink: Some("https://x.slack.com/archives/C1/p1".to_string()),
        },
        SearchMatch::default(),
    ];

    let report = mentions_report("ME", 24, matches, &dir, &priority(&dir));
    assert_eq!(report.priority_dm_count, 1);
    assert_eq!(report.other_mention_count, 1);

    let first = &report.priority_dms[0];
    assert_eq!(first.channel_name, "Ada Lovelace");
    assert_eq!(first.user, "Ada Lovelace");
    assert_eq!(first.text, "hey @Me Myself see this");
    assert_eq!(first.timestamp, "2023-11-14T22:13:20.000100+00:00");
    assert_eq!(
        first.permalink,
        "slack://channel?id=D1&message=1700000000000100"
    );

    let second = &report.other_mentions[0];
    assert_eq!(second.channel_name, "#general");
    assert_eq!(second.thread_ts.as_deref(), Some("1699999999.000000"));
    assert_eq!(second.permalink, "https://x.slack.com/archives/C1/p1");
}

#[test]
fn activity_counts_own_messages() {
    let dir = directory();
    let histories = vec![
        (
            channel("C1", "general"),
            vec![
                message("ME", "1", "a"),
                message("U2", "2", "b"),
                message("ME", "3", "c"),
            ],
        ),
        (channel("C2", "quiet"), vec![message("U2", "4", "d")]),
        (dm("D1", "U1"), vec![message("ME", "5", "e")]),
        (dm("D2", "U2"), vec![message("ME", "6", "f")]),
    ];

    let report = activity_report("ME", 24, &histories, &dir, &priority(&dir));
    assert_eq!(report.total_messages, 4);
    assert_eq!(report.priority_dms.len(), 1);
    assert_eq!(report.priority_dms[0].user, "Ada Lovelace");
    assert_eq!(report.priority_dms[0].channel_id, "D1");
    assert_eq!(report.channel_activity.get("#general"), Some(&2));
    assert_eq!(report.channel_activity.get("DM: Grace Hopper"), Some(&1));
    assert!(!report.channel_activity.contains_key("#quiet"));
}

#[test]
fn dms_sort_priority_first_then_count() {
    let dir = directory();
    let long_text = "x".repeat(150);
    let histories = vec![
        (
            dm("D2", "U2"),
            vec![message("U2", "2", &long_text), message("ME", "1", "a")],
        ),
        (dm("D1", "U1"), vec![message("U1", "3", "hi")]),
        (dm("D3", "UX"), vec![]),
    ];

    let dms = dm_summaries(&histories, &dir, &priority(&dir));
    assert_eq!(dms.len(), 2);
    assert_eq!(dms[0].user, "Ada Lovelace");
    assert!(dms[0].is_priority);
    assert_eq!(dms[1].user, "Grace Hopper");
    assert_eq!(dms[1].message_count, 2);

    let latest = dms[1].latest_message.as_ref().unwrap();
    assert_eq!(latest.text.chars().count(), 100);
}

// ===========================================
// Linear reshaping
// ===========================================

fn issue_json() -> Value {
    json!({
        "id": "i1",
        "identifier": "ENG-1",
        "title": "Fix it",
        "description": null,
        "priority": 2,
        "priorityLabel": "High",
        "url": "https://linear.app/x/issue/ENG-1",
        "createdAt": "2025-11-01T10:00:00.000Z",
        "updatedAt": "2025-11-03T10:00:00.000Z",
        "dueDate": null,
        "state": {"id": "s", "name": "In Progress", "type": "started", "color": "#fff"},
        "team": {"id": "t", "key": "ENG", "name": "Engineering"},
        "assignee": {"id": "u", "name": "Ada", "email": "a@x.io"},
        "creator": null,
        "project": null,
        "labels": {"nodes": [{"id": "l", "name": "bug", "color": "#f00"}]},
        "comments": {"nodes": [
            {"id": "c1", "createdAt": "2025-11-02T00:00:00.000Z", "body": "first", "user": {"name": "Ada"}},
            {"id": "c2", "createdAt": "2025-11-03T00:00:00.000Z", "body": "second", "user": null}
        ]},
        "parent": null,
        "children": {"nodes": [{"id": "i2", "identifier": "ENG-2", "title": "Sub"}]}
    })
}

#[test]
fn summarize_issue_flattens_connections() {
    let issue: IssueNode = serde_json::from_value(issue_json()).unwrap();
    let summary = summarize_issue(issue);
    assert_eq!(summary.description, "");
    assert_eq!(summary.comment_count, 2);
    assert_eq!(summary.latest_comment.as_ref().unwrap().body, "second");
    assert_eq!(summary.child_count, 1);
    assert_eq!(summary.labels[0].name, "bug");

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["priority"], 2);
    assert_eq!(value["priority_label"], "High");
    assert_eq!(value["state"]["type"], "started");
    assert_eq!(value["latest_comment"]["createdAt"], "2025-11-03T00:00:00.000Z");
    assert_eq!(value["creator"], Value::Null);
}

#[test]
fn issues_report_counts() {
    let issue: IssueNode = serde_json::from_value(issue_json()).unwrap();
    let viewer = Viewer {
        id: "u".to_string(),
        name: "Ada".to_string(),
        email: None,
    };
    let report = issues_report(viewer, "active", vec![issue]);
    assert_eq!(report.count, 1);
    assert_eq!(report.mode, "active");
    assert_eq!(report.issues[0].identifier, "ENG-1");
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

#[test]
fn day_and_week_boundaries() {
    // 2025-11-05 is a Wednesday.
    let now = at(2025, 11, 5, 15);
    assert_eq!(start_of_day(now), at(2025, 11, 5, 0));
    assert_eq!(start_of_week(now), at(2025, 11, 3, 0));
    assert_eq!(start_of_week(at(2025, 11, 3, 1)), at(2025, 11, 3, 0));
    assert_eq!(start_of_week(at(2025, 11, 9, 23)), at(2025, 11, 3, 0));
}
