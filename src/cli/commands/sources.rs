//! Sources command implementations.

use std::path::PathBuf;

use colored::Colorize;

use crate::cli::SourcesCommands;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::model::SyncedSource;

/// Execute sources commands.
pub fn execute(command: &SourcesCommands, config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    match command {
        SourcesCommands::List => list(config_path, json),
        SourcesCommands::Add {
            list_gid,
            name,
            file,
            personal,
        } => add(list_gid, name, file, *personal, config_path, json),
        SourcesCommands::Remove { name } => remove(name, config_path, json),
    }
}

fn list(config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load(config_path.map(PathBuf::as_path))?;

    if json {
        println!("{}", serde_json::to_string(&settings.sources)?);
        return Ok(());
    }

    if settings.sources.is_empty() {
        println!("No sources configured.");
        println!("Add one: taskmark sources add <list-gid> <name> <file>");
        return Ok(());
    }

    for source in &settings.sources {
        let kind = if source.personal { "personal" } else { "project" };
        println!(
            "  {}  {} ({kind}) -> {}",
            source.list_gid,
            source.name.bold(),
            source.file.display()
        );
    }
    Ok(())
}

fn add(
    list_gid: &str,
    name: &str,
    file: &PathBuf,
    personal: bool,
    config_path: Option<&PathBuf>,
    json: bool,
) -> Result<()> {
    let mut settings = Settings::load(config_path.map(PathBuf::as_path))?;

    if settings.source(name).is_some() {
        return Err(Error::SourceExists {
            name: name.to_string(),
        });
    }

    settings.sources.push(SyncedSource {
        list_gid: list_gid.to_string(),
        name: name.to_string(),
        file: file.clone(),
        personal,
    });
    settings.save(config_path.map(PathBuf::as_path))?;

    if json {
        println!("{}", serde_json::json!({ "success": true, "name": name }));
    } else {
        println!(
            "{} Added source {} ({} -> {})",
            "✓".green(),
            name.bold(),
            list_gid,
            file.display()
        );
        println!("Run `taskmark sync --source {name}` to create the document.");
    }
    Ok(())
}

fn remove(name: &str, config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let mut settings = Settings::load(config_path.map(PathBuf::as_path))?;

    let before = settings.sources.len();
    settings.sources.retain(|s| s.name != name);
    if settings.sources.len() == before {
        return Err(Error::SourceNotFound {
            name: name.to_string(),
        });
    }
    settings.save(config_path.map(PathBuf::as_path))?;

    if json {
        println!("{}", serde_json::json!({ "success": true, "name": name }));
    } else {
        println!("{} Removed source {}", "✓".green(), name.bold());
        println!("The document itself was left in place.");
    }
    Ok(())
}
