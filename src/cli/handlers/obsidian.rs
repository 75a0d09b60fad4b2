//! Obsidian command handlers.

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::config::Config;
use crate::cli::output::{
    CommandExecuted, CommandList, NoteAction, NoteAppended, NoteContent, NoteCreated, NoteExists,
    SectionAppended, print_json,
};
use crate::cli::{ObsidianArgs, ObsidianCommand};
use crate::domain::Document;
use crate::infra::obsidian::RELOAD_COMMAND;
use crate::infra::{ObsidianClient, Vault};

pub fn handle_obsidian(args: &ObsidianArgs, config: &Config) -> Result<()> {
    let api_key = config.obsidian.api_key.resolve("Obsidian API key")?;
    let client = ObsidianClient::new(&config.obsidian.url, api_key, config.timeout())?;
    let reload = config.obsidian.reload_after_write && !args.no_reload;
    run_obsidian(&args.command, &client, reload)
}

/// Dispatches one operation against a vault and prints its result.
pub(crate) fn run_obsidian<V: Vault>(
    command: &ObsidianCommand,
    vault: &V,
    reload_after_write: bool,
) -> Result<()> {
    match command {
        ObsidianCommand::Read { path } => print_json(&read_note(vault, path)?),
        ObsidianCommand::Exists { path } => print_json(&note_exists(vault, path)?),
        ObsidianCommand::Create { path, content } => {
            let result = create_note(vault, path, content)?;
            reload_if(vault, reload_after_write);
            print_json(&result)
        }
        ObsidianCommand::Append { path, content } => {
            let result = append_note(vault, path, content)?;
            reload_if(vault, reload_after_write);
            match result {
                Appended::Existing(result) => print_json(&result),
                Appended::Created(result) => print_json(&result),
            }
        }
        ObsidianCommand::AppendSection {
            path,
            header,
            content,
        } => {
            let result = append_to_section(vault, path, header, content)?;
            reload_if(vault, reload_after_write);
            print_json(&result)
        }
        ObsidianCommand::ListCommands => print_json(&list_commands(vault)?),
        ObsidianCommand::ExecuteCommand { command_id } => {
            print_json(&execute_command(vault, command_id)?)
        }
        ObsidianCommand::Reload => print_json(&execute_command(vault, RELOAD_COMMAND)?),
    }
}

/// Runs `app:reload` so the app picks up the rewritten file. Failure is
/// not fatal: the write already succeeded.
fn reload_if<V: Vault>(vault: &V, enabled: bool) {
    if !enabled {
        return;
    }
    if let Err(err) = vault.execute_command(RELOAD_COMMAND) {
        warn!("reload after write failed: {}", err);
    }
}

pub(crate) fn read_note<V: Vault>(vault: &V, path: &str) -> Result<NoteContent> {
    let content = vault
        .read(path)
        .with_context(|| format!("failed to read note '{}'", path))?;
    let Some(content) = content else {
        bail!("note not found: '{}'", path);
    };
    Ok(NoteContent {
        success: true,
        path: path.to_string(),
        content,
        exists: true,
    })
}

pub(crate) fn note_exists<V: Vault>(vault: &V, path: &str) -> Result<NoteExists> {
    let content = vault
        .read(path)
        .with_context(|| format!("failed to read note '{}'", path))?;
    Ok(NoteExists {
        success: true,
        path: path.to_string(),
        exists: content.is_some(),
    })
}

pub(crate) fn create_note<V: Vault>(vault: &V, path: &str, content: &str) -> Result<NoteCreated> {
    write_note(vault, path, content)?;
    info!("Created note {}", path);
    Ok(NoteCreated {
        success: true,
        path: path.to_string(),
        action: NoteAction::Created,
        content: content.to_string(),
    })
}

/// Outcome of `append`: a missing note is created instead.
#[derive(Debug)]
pub(crate) enum Appended {
    Existing(NoteAppended),
    Created(NoteCreated),
}

pub(crate) fn append_note<V: Vault>(vault: &V, path: &str, content: &str) -> Result<Appended> {
    let existing = vault
        .read(path)
        .with_context(|| format!("failed to read note '{}'", path))?;
    let Some(existing) = existing else {
        return create_note(vault, path, content).map(Appended::Created);
    };

    write_note(vault, path, &format!("{}\n{}", existing, content))?;
    info!("Appended to note {}", path);
    Ok(Appended::Existing(NoteAppended {
        success: true,
        path: path.to_string(),
        action: NoteAction::Appended,
        appended_content: content.to_string(),
    }))
}

/// Reads the note, inserts `content` into the section headed by `header`,
/// and writes the whole note back. A missing note is edited as an empty
/// document.
pub(crate) fn append_to_section<V: Vault>(
    vault: &V,
    path: &str,
    header: &str,
    content: &str,
) -> Result<SectionAppended> {
    let existing = vault
        .read(path)
        .with_context(|| format!("failed to read note '{}'", path))?;

    let mut document = existing.as_deref().map(Document::parse).unwrap_or_default();
    let outcome = document.insert_into_section(header, content);
    write_note(vault, path, &document.to_text())?;

    info!(
        section_found = outcome.section_found,
        line = outcome.line,
        "Appended to section {} in {}",
        header,
        path
    );
    Ok(SectionAppended {
        success: true,
        path: path.to_string(),
        action: NoteAction::AppendedToSection,
        section: header.to_string(),
        section_found: outcome.section_found,
        appended_content: content.to_string(),
    })
}

pub(crate) fn list_commands<V: Vault>(vault: &V) -> Result<CommandList> {
    let commands = vault
        .list_commands()
        .context("failed to list Obsidian commands")?;
    Ok(CommandList {
        success: true,
        commands,
    })
}

pub(crate) fn execute_command<V: Vault>(vault: &V, command_id: &str) -> Result<CommandExecuted> {
    vault
        .execute_command(command_id)
        .with_context(|| format!("failed to execute command '{}'", command_id))?;
    Ok(CommandExecuted {
        success: true,
        command_id: command_id.to_string(),
        executed: true,
    })
}

fn write_note<V: Vault>(vault: &V, path: &str, content: &str) -> Result<()> {
    vault
        .write(path, content)
        .with_context(|| format!("failed to write note '{}'", path))
}
