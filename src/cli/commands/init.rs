//! Init command implementation.

use std::path::PathBuf;

use colored::Colorize;

use crate::config::{resolve_config_path, Settings};
use crate::error::{Error, Result};

/// Write a starter config file.
///
/// Refuses to overwrite an existing file unless `--force` is given.
pub fn execute(force: bool, config_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let target = resolve_config_path(config_path.map(PathBuf::as_path))
        .ok_or_else(|| Error::Config("cannot resolve a config location".to_string()))?;

    if target.exists() && !force {
        return Err(Error::Config(format!(
            "config already exists at {} (use --force to overwrite)",
            target.display()
        )));
    }

    let written = Settings::default().save(Some(&target))?;

    if json {
        let output = serde_json::json!({
            "success": true,
            "config": written.display().to_string(),
        });
        println!("{output}");
    } else {
        println!("{} Wrote starter config to {}", "✓".green(), written.display());
        println!();
        println!("Next steps:");
        println!("  1. Set your Asana personal access token (token field or TASKMARK_TOKEN)");
        println!("  2. Set workspace_gid and vault_dir");
        println!("  3. Add a source: taskmark sources add <list-gid> <name> <file>");
        println!("  4. Verify: taskmark auth");
    }

    Ok(())
}
