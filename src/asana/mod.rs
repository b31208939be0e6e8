//! Asana API integration.
//!
//! [`client`] talks to the Asana REST API (v1.0) over HTTPS; [`types`]
//! holds the wire DTOs. The [`TaskApi`] trait seams the two operations
//! the sync layer needs, so engine and detector tests can substitute an
//! in-memory remote.

pub mod client;
pub mod types;

pub use client::AsanaClient;
pub use types::{CreateTask, Project, Section, User, Workspace};

use crate::error::Result;
use crate::model::{RemoteTask, SyncedSource};

/// Remote task operations consumed by the sync layer.
///
/// Implemented by [`AsanaClient`]; tests provide in-memory doubles.
pub trait TaskApi: Send + Sync {
    /// Fetch the full task set for a source, following pagination to
    /// exhaustion. Respects the source's personal-list flag.
    fn tasks_for(
        &self,
        source: &SyncedSource,
    ) -> impl std::future::Future<Output = Result<Vec<RemoteTask>>> + Send;

    /// Update a task's completion flag.
    fn set_completed(
        &self,
        task_gid: &str,
        completed: bool,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
