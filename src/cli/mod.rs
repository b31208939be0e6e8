//! CLI definitions using clap.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Taskmark CLI - Bidirectional sync between Asana and Markdown checklists
#[derive(Parser, Debug)]
#[command(name = "taskmark", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (default: ~/.taskmark/config.json)
    #[arg(long, global = true, env = "TASKMARK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configured Asana token
    Auth,

    /// Manage synced sources
    Sources {
        #[command(subcommand)]
        command: SourcesCommands,
    },

    /// Run one reconciliation pass over the configured sources
    Sync {
        /// Sync only the source with this name
        #[arg(long)]
        source: Option<String>,
    },

    /// Sync continuously: periodic passes plus document watching
    Watch,

    /// Show configuration and per-source document state
    Status,

    /// List workspace projects (or one project's sections)
    Projects {
        /// Project gid: list its sections instead
        project_gid: Option<String>,
    },

    /// Create a task under a source's project
    Add(AddArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum SourcesCommands {
    /// List configured sources
    List,

    /// Add a source
    Add {
        /// Remote list gid (project, or user task list with --personal)
        list_gid: String,

        /// Display name, also used as the document header
        name: String,

        /// Document path, relative to the vault root
        file: PathBuf,

        /// The gid names a personal task list, not a project
        #[arg(long)]
        personal: bool,
    },

    /// Remove a source by name
    Remove {
        /// Source name
        name: String,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Source name to create the task under
    pub source: String,

    /// Task title
    pub title: String,

    /// Section name to file the task into
    #[arg(long)]
    pub section: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<NaiveDate>,

    /// Assign the task to the authenticated user
    #[arg(long)]
    pub me: bool,

    /// Task notes
    #[arg(long)]
    pub notes: Option<String>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
