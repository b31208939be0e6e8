//! Auth command implementation.
//!
//! Token validation surfaces as a boolean, never as a propagated
//! fault: a rejected or unreachable token prints a diagnosis and maps
//! to a non-zero exit through a regular error value.

use std::path::PathBuf;

use colored::Colorize;

use crate::asana::AsanaClient;
use crate::config::Settings;
use crate::error::{Error, Result};

/// Validate the configured token against the Asana API.
pub fn execute(config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let settings = Settings::load(config_path.map(PathBuf::as_path))?;
    let token = settings.resolve_token()?;
    let client = AsanaClient::new(token);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    rt.block_on(async {
        let valid = client.validate_token().await;

        if !valid {
            if json {
                println!("{}", serde_json::json!({ "valid": false }));
            } else {
                println!("{} Token rejected (or Asana unreachable)", "✗".red());
            }
            return Err(Error::Api("access token rejected by Asana".to_string()));
        }

        let user = client.me().await?;
        let workspaces = client.workspaces().await?;

        // The personal task list gid is what a --personal source needs.
        let personal_list = match settings.workspace_gid.as_deref() {
            Some(workspace_gid) => Some(client.user_task_list_gid(&user.gid, workspace_gid).await?),
            None => None,
        };

        if json {
            let output = serde_json::json!({
                "valid": true,
                "user": { "gid": user.gid, "name": user.name },
                "personal_list_gid": personal_list,
                "workspaces": workspaces
                    .iter()
                    .map(|w| serde_json::json!({ "gid": w.gid, "name": w.name }))
                    .collect::<Vec<_>>(),
            });
            println!("{output}");
        } else {
            println!("{} Authenticated as {}", "✓".green(), user.name.bold());
            println!();
            println!("Workspaces:");
            for workspace in &workspaces {
                let marker = if settings.workspace_gid.as_deref() == Some(&workspace.gid) {
                    "*"
                } else {
                    " "
                };
                println!("  {marker} {}  {}", workspace.gid, workspace.name);
            }
            if let Some(list_gid) = &personal_list {
                println!();
                println!("Personal task list: {list_gid} (use with `sources add --personal`)");
            }
        }

        Ok(())
    })
}
