//! Wire types for the Asana REST API.
//!
//! Asana wraps every payload in a `data` envelope and paginates with an
//! opaque `offset` token under `next_page`. Only the fields Taskmark
//! requests via `opt_fields` are modeled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Assignee, Membership, RemoteTask};

/// Response envelope: `{"data": ..., "next_page": {...}}`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub next_page: Option<NextPage>,
}

/// Pagination continuation.
#[derive(Debug, Deserialize)]
pub struct NextPage {
    pub offset: String,
}

/// Request envelope: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct RequestBody<T> {
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    pub gid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub gid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    pub gid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub gid: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserTaskList {
    pub gid: String,
}

/// One `memberships` entry on a task.
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipData {
    pub project: Option<Project>,
    pub section: Option<Section>,
}

/// Task payload as returned with Taskmark's `opt_fields`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskData {
    pub gid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
    #[serde(default)]
    pub memberships: Vec<MembershipData>,
}

impl From<TaskData> for RemoteTask {
    fn from(data: TaskData) -> Self {
        Self {
            gid: data.gid,
            name: data.name,
            completed: data.completed,
            due_on: data.due_on,
            assignee: data.assignee.map(|u| Assignee {
                gid: u.gid,
                name: u.name,
            }),
            notes: data.notes.filter(|n| !n.is_empty()),
            permalink_url: data.permalink_url,
            memberships: data
                .memberships
                .into_iter()
                .filter_map(|m| {
                    let project = m.project?;
                    let section = m.section?;
                    Some(Membership {
                        list_gid: project.gid,
                        section_gid: section.gid,
                        section_name: section.name,
                    })
                })
                .collect(),
        }
    }
}

/// Parameters for creating a task under a project.
#[derive(Debug, Clone, Default)]
pub struct CreateTask {
    pub name: String,
    pub project_gid: String,
    /// Section to file the task under, when given.
    pub section_gid: Option<String>,
    pub due_on: Option<NaiveDate>,
    /// Assignee user gid.
    pub assignee: Option<String>,
    pub notes: Option<String>,
}

/// Body of `PUT /tasks/{gid}` for a completion update.
#[derive(Debug, Serialize)]
pub struct TaskUpdateFields {
    pub completed: bool,
}

/// Body of `POST /tasks`.
#[derive(Debug, Serialize)]
pub struct TaskCreateFields {
    pub name: String,
    pub projects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /sections/{gid}/addTask`.
#[derive(Debug, Serialize)]
pub struct AddTaskFields {
    pub task: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_data_into_remote_task() {
        let json = r#"{
            "gid": "1203",
            "name": "Draft brief",
            "completed": false,
            "due_on": "2025-04-10",
            "assignee": {"gid": "77", "name": "Sam"},
            "notes": "",
            "permalink_url": "https://app.asana.com/0/1200/1203",
            "memberships": [
                {"project": {"gid": "1200", "name": "Launch"},
                 "section": {"gid": "55", "name": "Doing"}},
                {"project": {"gid": "1201", "name": "Other"}, "section": null}
            ]
        }"#;
        let data: TaskData = serde_json::from_str(json).unwrap();
        let task = RemoteTask::from(data);

        assert_eq!(task.gid, "1203");
        assert_eq!(task.assignee.as_ref().unwrap().name, "Sam");
        // Empty notes collapse to None; memberships without a section
        // are dropped.
        assert_eq!(task.notes, None);
        assert_eq!(task.memberships.len(), 1);
        assert_eq!(task.section_in("1200"), Some("Doing"));
        assert_eq!(task.section_in("1201"), None);
    }

    #[test]
    fn test_envelope_with_pagination() {
        let json = r#"{"data": [], "next_page": {"offset": "eyJ0eXAi"}}"#;
        let page: Envelope<Vec<TaskData>> = serde_json::from_str(json).unwrap();
        assert_eq!(page.next_page.unwrap().offset, "eyJ0eXAi");
    }

    #[test]
    fn test_create_fields_skip_absent_options() {
        let fields = TaskCreateFields {
            name: "T".to_string(),
            projects: vec!["1".to_string()],
            due_on: None,
            assignee: None,
            notes: None,
        };
        let json = serde_json::to_string(&RequestBody { data: fields }).unwrap();
        assert!(!json.contains("due_on"));
        assert!(!json.contains("assignee"));
    }
}
