//! Data types for Taskmark.
//!
//! - [`task`] - Remote task snapshots and parsed local task lines
//! - [`source`] - Synced source configuration and display options

pub mod source;
pub mod task;

pub use source::{DisplayOptions, SyncedSource};
pub use task::{Assignee, LocalTask, Membership, RemoteTask};
