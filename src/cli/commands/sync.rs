//! Sync command implementation: one reconciliation pass.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::asana::AsanaClient;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::sync::{try_begin_pass, ReconciliationEngine, SourceOutcome, WriteGuard};

/// Run one pass over all configured sources, or one source by name.
pub fn execute(source_filter: Option<&str>, config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load(config_path.map(PathBuf::as_path))?;
    let token = settings.resolve_token()?;

    let sources = match source_filter {
        Some(name) => vec![settings
            .source(name)
            .cloned()
            .ok_or_else(|| Error::SourceNotFound {
                name: name.to_string(),
            })?],
        None => settings.sources.clone(),
    };

    if sources.is_empty() {
        println!("No sources configured. Add one: taskmark sources add <list-gid> <name> <file>");
        return Ok(());
    }

    let client = AsanaClient::new(token);
    let store = DocumentStore::new(&settings.vault_dir);
    let guard = Arc::new(WriteGuard::default());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let outcomes = rt.block_on(async {
        let Some(_pass) = try_begin_pass() else {
            return Err(Error::Other(
                "a reconciliation pass is already in progress".to_string(),
            ));
        };
        let engine = ReconciliationEngine::new(&client, &store, settings.display, guard);
        Ok(engine.sync_all(&sources).await)
    })?;

    report(&outcomes, json)
}

/// Print per-source results; a failing source is reported by name and
/// turns the run into an error after every source has been shown.
pub fn report(outcomes: &[SourceOutcome], json: bool) -> Result<()> {
    if json {
        let entries: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(stats) => serde_json::json!({ "source": o.source, "stats": stats }),
                Err(e) => serde_json::json!({ "source": o.source, "error": e.to_string() }),
            })
            .collect();
        println!("{}", serde_json::to_string(&entries)?);
    } else {
        for outcome in outcomes {
            match &outcome.result {
                Ok(stats) if stats.is_noop() => {
                    println!("  {} {}: up to date", "·".dimmed(), outcome.source);
                }
                Ok(stats) => {
                    println!(
                        "  {} {}: {} added, {} updated, {} completion change{}",
                        "✓".green(),
                        outcome.source.bold(),
                        stats.added,
                        stats.updated,
                        stats.completion_changes,
                        if stats.completion_changes == 1 { "" } else { "s" }
                    );
                }
                Err(error) => {
                    println!("  {} {}: {error}", "✗".red(), outcome.source.bold());
                }
            }
        }
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if failed > 0 {
        return Err(Error::Api(format!(
            "{failed} of {} source{} failed to sync",
            outcomes.len(),
            if outcomes.len() == 1 { "" } else { "s" }
        )));
    }
    Ok(())
}
