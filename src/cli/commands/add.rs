//! Add command implementation: create a remote task.
//!
//! The new task is created under the source's project; its checkbox
//! line appears in the document on the next reconciliation pass.

use std::path::PathBuf;

use colored::Colorize;

use crate::asana::{AsanaClient, CreateTask};
use crate::cli::AddArgs;
use crate::config::Settings;
use crate::error::{Error, Result};

/// Create a task under a source's project.
pub fn execute(args: &AddArgs, config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load(config_path.map(PathBuf::as_path))?;
    let token = settings.resolve_token()?;

    let source = settings
        .source(&args.source)
        .ok_or_else(|| Error::SourceNotFound {
            name: args.source.clone(),
        })?;
    if source.personal {
        return Err(Error::InvalidArgument(
            "tasks can only be created under project sources".to_string(),
        ));
    }

    let client = AsanaClient::new(token);
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    rt.block_on(async {
        let section_gid = match args.section.as_deref() {
            Some(name) => {
                let sections = client.sections(&source.list_gid).await?;
                let section = sections.into_iter().find(|s| s.name == name).ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "no section named '{name}' in {}",
                        source.name
                    ))
                })?;
                Some(section.gid)
            }
            None => None,
        };

        let assignee = if args.me {
            Some(client.me().await?.gid)
        } else {
            None
        };

        let task = client
            .create_task(CreateTask {
                name: args.title.clone(),
                project_gid: source.list_gid.clone(),
                section_gid,
                due_on: args.due,
                assignee,
                notes: args.notes.clone(),
            })
            .await?;

        if json {
            let output = serde_json::json!({
                "success": true,
                "gid": task.gid,
                "permalink_url": task.permalink_url,
            });
            println!("{output}");
        } else {
            println!("{} Created \"{}\" ({})", "✓".green(), args.title, task.gid);
            if let Some(url) = &task.permalink_url {
                println!("  {url}");
            }
            println!("Run `taskmark sync --source {}` to pull it into the document.", args.source);
        }

        Ok(())
    })
}
