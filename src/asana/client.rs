//! Asana REST client.
//!
//! Thin HTTPS client over the v1.0 API. All calls are sequential; task
//! fetches follow `offset` pagination to exhaustion, one request at a
//! time. Errors carry the failing endpoint and the response body so a
//! sync failure names its cause.

use crate::error::{Error, Result};
use crate::model::{RemoteTask, SyncedSource};

use super::types::{
    AddTaskFields, CreateTask, Envelope, Project, RequestBody, Section, TaskCreateFields,
    TaskData, TaskUpdateFields, User, UserTaskList, Workspace,
};
use super::TaskApi;

/// Production API endpoint.
const DEFAULT_BASE_URL: &str = "https://app.asana.com/api/1.0";

/// Fields requested on every task fetch. Keep in sync with
/// [`super::types::TaskData`].
const TASK_OPT_FIELDS: &str = "name,completed,due_on,assignee.name,notes,permalink_url,\
                               memberships.project.gid,memberships.section.name";

/// Page size for task fetches.
const PAGE_LIMIT: &str = "100";

/// Client for the Asana REST API.
pub struct AsanaClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl AsanaClient {
    /// Create a client for the production endpoint.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (used by tests).
    #[must_use]
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Api(format!("GET {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("GET {path} returned {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Api(format!("GET {path} returned invalid JSON: {e}")))
    }

    async fn send_body<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &RequestBody<B>,
    ) -> Result<Envelope<T>> {
        let url = format!("{}{path}", self.base_url);
        let label = method.as_str().to_string();
        let response = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Api(format!("{label} {path} failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "{label} {path} returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Api(format!("{label} {path} returned invalid JSON: {e}")))
    }

    /// Fetch every page of a task collection endpoint.
    async fn tasks_paginated(&self, path: &str) -> Result<Vec<RemoteTask>> {
        let mut tasks = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> =
                vec![("opt_fields", TASK_OPT_FIELDS), ("limit", PAGE_LIMIT)];
            if let Some(token) = offset.as_deref() {
                query.push(("offset", token));
            }

            let page: Envelope<Vec<TaskData>> = self.get(path, &query).await?;
            tasks.extend(page.data.into_iter().map(RemoteTask::from));

            match page.next_page {
                Some(next) => offset = Some(next.offset),
                None => break,
            }
        }

        Ok(tasks)
    }

    /// List workspaces visible to the token.
    pub async fn workspaces(&self) -> Result<Vec<Workspace>> {
        let page: Envelope<Vec<Workspace>> = self.get("/workspaces", &[]).await?;
        Ok(page.data)
    }

    /// List unarchived projects in a workspace.
    pub async fn projects(&self, workspace_gid: &str) -> Result<Vec<Project>> {
        let page: Envelope<Vec<Project>> = self
            .get(
                "/projects",
                &[("workspace", workspace_gid), ("archived", "false")],
            )
            .await?;
        Ok(page.data)
    }

    /// List sections in a project.
    pub async fn sections(&self, project_gid: &str) -> Result<Vec<Section>> {
        let path = format!("/projects/{project_gid}/sections");
        let page: Envelope<Vec<Section>> = self.get(&path, &[]).await?;
        Ok(page.data)
    }

    /// Fetch the current user.
    pub async fn me(&self) -> Result<User> {
        let page: Envelope<User> = self.get("/users/me", &[]).await?;
        Ok(page.data)
    }

    /// Fetch the user's personal task list gid for a workspace.
    pub async fn user_task_list_gid(
        &self,
        user_gid: &str,
        workspace_gid: &str,
    ) -> Result<String> {
        let path = format!("/users/{user_gid}/user_task_list");
        let page: Envelope<UserTaskList> =
            self.get(&path, &[("workspace", workspace_gid)]).await?;
        Ok(page.data.gid)
    }

    /// Fetch all tasks of a project list.
    pub async fn project_tasks(&self, project_gid: &str) -> Result<Vec<RemoteTask>> {
        self.tasks_paginated(&format!("/projects/{project_gid}/tasks"))
            .await
    }

    /// Fetch all tasks of a personal task list.
    pub async fn user_task_list_tasks(&self, list_gid: &str) -> Result<Vec<RemoteTask>> {
        self.tasks_paginated(&format!("/user_task_lists/{list_gid}/tasks"))
            .await
    }

    /// Create a task under a project, filing it into a section when one
    /// is given.
    pub async fn create_task(&self, create: CreateTask) -> Result<RemoteTask> {
        let body = RequestBody {
            data: TaskCreateFields {
                name: create.name,
                projects: vec![create.project_gid],
                due_on: create.due_on,
                assignee: create.assignee,
                notes: create.notes,
            },
        };
        let page: Envelope<TaskData> = self
            .send_body(reqwest::Method::POST, "/tasks", &body)
            .await?;
        let task = RemoteTask::from(page.data);

        if let Some(section_gid) = create.section_gid {
            let path = format!("/sections/{section_gid}/addTask");
            let body = RequestBody {
                data: AddTaskFields {
                    task: task.gid.clone(),
                },
            };
            let _: Envelope<serde_json::Value> =
                self.send_body(reqwest::Method::POST, &path, &body).await?;
        }

        Ok(task)
    }

    /// Check whether the configured token is valid.
    ///
    /// Credential problems surface as `false`, never as an error.
    pub async fn validate_token(&self) -> bool {
        let url = format!("{}/users/me", self.base_url);
        match self.client.get(&url).bearer_auth(&self.token).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

impl TaskApi for AsanaClient {
    async fn tasks_for(&self, source: &SyncedSource) -> Result<Vec<RemoteTask>> {
        if source.personal {
            self.user_task_list_tasks(&source.list_gid).await
        } else {
            self.project_tasks(&source.list_gid).await
        }
    }

    async fn set_completed(&self, task_gid: &str, completed: bool) -> Result<()> {
        let path = format!("/tasks/{task_gid}");
        let body = RequestBody {
            data: TaskUpdateFields { completed },
        };
        let _: Envelope<serde_json::Value> = self
            .send_body(reqwest::Method::PUT, &path, &body)
            .await?;
        Ok(())
    }
}
