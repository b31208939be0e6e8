//! Synced source configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One configured pairing of a remote list with a local document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedSource {
    /// Remote list gid: a project gid, or a user task list gid when
    /// `personal` is set.
    pub list_gid: String,
    /// Display name, also used as the bootstrap document header.
    pub name: String,
    /// Document path, relative to the vault root.
    pub file: PathBuf,
    /// Personal task list rather than a project list. Changes which
    /// fetch endpoint is used and which section memberships apply.
    #[serde(default)]
    pub personal: bool,
}

/// Display toggles applied when formatting task lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub show_due_date: bool,
    pub show_assignee: bool,
    /// When off, completed tasks are dropped from the document (remote
    /// state is untouched; lines reappear once a task is reopened).
    pub show_completed: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_due_date: true,
            show_assignee: true,
            show_completed: true,
        }
    }
}
