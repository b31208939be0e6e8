//! Projects command implementation.
//!
//! Lists unarchived projects in the configured workspace so a list gid
//! can be copied into `sources add`. With a project gid argument, lists
//! that project's sections instead.

use std::path::PathBuf;

use colored::Colorize;

use crate::asana::AsanaClient;
use crate::config::Settings;
use crate::error::{Error, Result};

/// List projects in the configured workspace, or sections of one
/// project.
pub fn execute(project_gid: Option<&str>, config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load(config_path.map(PathBuf::as_path))?;
    let token = settings.resolve_token()?;
    let client = AsanaClient::new(token);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    rt.block_on(async {
        if let Some(gid) = project_gid {
            let sections = client.sections(gid).await?;
            if json {
                let entries: Vec<serde_json::Value> = sections
                    .iter()
                    .map(|s| serde_json::json!({ "gid": s.gid, "name": s.name }))
                    .collect();
                println!("{}", serde_json::to_string(&entries)?);
            } else {
                for section in &sections {
                    println!("  {}  {}", section.gid, section.name);
                }
            }
            return Ok(());
        }

        let workspace_gid = settings
            .workspace_gid
            .as_deref()
            .ok_or(Error::WorkspaceNotFound)?;
        let projects = client.projects(workspace_gid).await?;

        if json {
            let entries: Vec<serde_json::Value> = projects
                .iter()
                .map(|p| serde_json::json!({ "gid": p.gid, "name": p.name }))
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        } else if projects.is_empty() {
            println!("No unarchived projects in workspace {workspace_gid}.");
        } else {
            for project in &projects {
                println!("  {}  {}", project.gid, project.name.bold());
            }
            println!();
            println!("Add one: taskmark sources add <gid> <name> <file>");
        }

        Ok(())
    })
}
