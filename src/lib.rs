//! Taskmark CLI - Bidirectional sync between Asana and Markdown checklists
//!
//! Each Asana task round-trips through a single checkbox line embedding
//! the task's gid in a trailing comment; either side may be edited
//! between passes and the reconciliation engine brings them back into
//! agreement.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (RemoteTask, LocalTask, SyncedSource)
//! - [`document`] - Task line codec and document structure
//! - [`asana`] - Asana REST client and the TaskApi seam
//! - [`sync`] - Reconciliation engine and local change detector
//! - [`store`] - Vault-rooted document store with atomic writes
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asana;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
