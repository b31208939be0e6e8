//! Status command implementation.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::config::Settings;
use crate::document::Document;
use crate::error::Result;
use crate::store::DocumentStore;

/// Per-source state shown by `taskmark status`.
#[derive(Serialize)]
struct SourceStatus {
    name: String,
    list_gid: String,
    file: String,
    personal: bool,
    exists: bool,
    tracked_tasks: usize,
    last_synced: Option<String>,
}

#[derive(Serialize)]
struct StatusOutput {
    workspace_gid: Option<String>,
    vault_dir: String,
    sync_interval_secs: u64,
    show_due_date: bool,
    show_assignee: bool,
    show_completed: bool,
    sources: Vec<SourceStatus>,
}

/// Show configuration and per-source document state. Offline: nothing
/// here talks to the API.
pub fn execute(config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load(config_path.map(PathBuf::as_path))?;
    let store = DocumentStore::new(&settings.vault_dir);

    let sources: Vec<SourceStatus> = settings
        .sources
        .iter()
        .map(|source| {
            let exists = store.exists(&source.file);
            let (tracked_tasks, last_synced) = if exists {
                match store.read(&source.file) {
                    Ok(content) => {
                        let doc = Document::parse(&content);
                        (doc.tasks_by_gid().len(), last_synced_stamp(&doc))
                    }
                    Err(_) => (0, None),
                }
            } else {
                (0, None)
            };

            SourceStatus {
                name: source.name.clone(),
                list_gid: source.list_gid.clone(),
                file: source.file.display().to_string(),
                personal: source.personal,
                exists,
                tracked_tasks,
                last_synced,
            }
        })
        .collect();

    let output = StatusOutput {
        workspace_gid: settings.workspace_gid.clone(),
        vault_dir: settings.vault_dir.display().to_string(),
        sync_interval_secs: settings.sync_interval_secs,
        show_due_date: settings.display.show_due_date,
        show_assignee: settings.display.show_assignee,
        show_completed: settings.display.show_completed,
        sources,
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("{}", "Taskmark".bold());
    println!("  Vault:     {}", output.vault_dir);
    println!(
        "  Workspace: {}",
        output.workspace_gid.as_deref().unwrap_or("(not set)")
    );
    println!("  Interval:  {}s", output.sync_interval_secs);
    println!(
        "  Display:   due={} assignee={} completed={}",
        output.show_due_date, output.show_assignee, output.show_completed
    );
    println!();

    if output.sources.is_empty() {
        println!("No sources configured.");
        return Ok(());
    }

    println!("{}", "Sources".bold());
    for source in &output.sources {
        let state = if source.exists {
            format!(
                "{} tasks, last synced {}",
                source.tracked_tasks,
                source.last_synced.as_deref().unwrap_or("never")
            )
        } else {
            "document not created yet".to_string()
        };
        println!("  {} {} ({})", source.name.bold(), source.file, state);
    }

    Ok(())
}

/// Last-synced timestamp from the document frontmatter, if present.
fn last_synced_stamp(doc: &Document) -> Option<String> {
    let text = doc.frontmatter_text()?;
    text.lines()
        .find_map(|l| l.strip_prefix("synced:"))
        .map(|v| v.trim().to_string())
}
