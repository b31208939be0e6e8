//! Task models.
//!
//! [`RemoteTask`] is a transient snapshot of a task owned by Asana;
//! it is fetched fresh at the start of every reconciliation pass and
//! never cached across passes. [`LocalTask`] is a read-only view of one
//! document line, born during a parse pass and discarded with it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task assignee (identifier plus display name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub gid: String,
    pub name: String,
}

/// One section membership of a remote task.
///
/// Pairs the parent list (project) gid with the section it sits in.
/// A task can be multi-homed across projects, so a snapshot carries
/// every membership and the engine filters by the source's list gid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// Parent project (list) gid.
    pub list_gid: String,
    /// Section gid within the parent list.
    pub section_gid: String,
    /// Section display name.
    pub section_name: String,
}

/// Snapshot of a task as reported by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTask {
    /// Stable, unique remote identifier. The only valid join key
    /// between a document line and remote state.
    pub gid: String,
    pub name: String,
    pub completed: bool,
    /// Calendar due date, no time component.
    pub due_on: Option<NaiveDate>,
    pub assignee: Option<Assignee>,
    pub notes: Option<String>,
    pub permalink_url: Option<String>,
    pub memberships: Vec<Membership>,
}

impl RemoteTask {
    /// Section name for this task within the given list, if any.
    #[must_use]
    pub fn section_in(&self, list_gid: &str) -> Option<&str> {
        self.memberships
            .iter()
            .find(|m| m.list_gid == list_gid)
            .map(|m| m.section_name.as_str())
    }
}

/// A task parsed out of one document line.
///
/// Holds the original line text so the rewrite phase can preserve it
/// verbatim when the remote side stops reporting the task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTask {
    /// Original line text, untrimmed.
    pub line: String,
    /// Zero-based line number within the document.
    pub line_number: usize,
    pub completed: bool,
    pub title: String,
    pub due_on: Option<NaiveDate>,
    /// Assignee display name; the local side never knows the gid.
    pub assignee: Option<String>,
    /// Remote identifier from the trailing comment. A task without one
    /// is never pushed and never deleted by the engine.
    pub gid: Option<String>,
}
