//! Error types for the Taskmark CLI.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=config, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Taskmark operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Configuration (exit 2)
    NotConfigured,
    ConfigError,
    MissingToken,

    // Not Found (exit 3)
    SourceNotFound,
    WorkspaceNotFound,

    // Validation (exit 4)
    InvalidArgument,

    // Remote API (exit 5)
    ApiError,

    // Document (exit 6)
    DocumentError,

    // I/O (exit 7)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotConfigured => "NOT_CONFIGURED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::MissingToken => "MISSING_TOKEN",
            Self::SourceNotFound => "SOURCE_NOT_FOUND",
            Self::WorkspaceNotFound => "WORKSPACE_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ApiError => "API_ERROR",
            Self::DocumentError => "DOCUMENT_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code (1-7).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotConfigured | Self::ConfigError | Self::MissingToken => 2,
            Self::SourceNotFound | Self::WorkspaceNotFound => 3,
            Self::InvalidArgument => 4,
            Self::ApiError => 5,
            Self::DocumentError => 6,
            Self::IoError | Self::JsonError => 7,
        }
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in Taskmark CLI operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not configured: run `taskmark init` first")]
    NotConfigured,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No Asana access token configured")]
    MissingToken,

    #[error("Source not found: {name}")]
    SourceNotFound { name: String },

    #[error("Source already exists: {name}")]
    SourceExists { name: String },

    #[error("No workspace configured")]
    WorkspaceNotFound,

    #[error("Asana API error: {0}")]
    Api(String),

    #[error("Document error in {path}: {message}")]
    Document { path: PathBuf, message: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotConfigured => ErrorCode::NotConfigured,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::MissingToken => ErrorCode::MissingToken,
            Self::SourceNotFound { .. } | Self::SourceExists { .. } => ErrorCode::SourceNotFound,
            Self::WorkspaceNotFound => ErrorCode::WorkspaceNotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Api(_) => ErrorCode::ApiError,
            Self::Document { .. } => ErrorCode::DocumentError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotConfigured => {
                Some("Run `taskmark init` to create a starter config file".to_string())
            }

            Self::MissingToken => Some(
                "Set a personal access token in the config file or via TASKMARK_TOKEN.\n  \
                 Verify: taskmark auth"
                    .to_string(),
            ),

            Self::SourceNotFound { name } => Some(format!(
                "No source named '{name}'. Use `taskmark sources list` to see configured sources."
            )),

            Self::SourceExists { name } => Some(format!(
                "A source named '{name}' is already configured. Remove it first with \
                 `taskmark sources remove {name}`."
            )),

            Self::WorkspaceNotFound => Some(
                "Set `workspace_gid` in the config file; `taskmark auth` prints the \
                 workspaces your token can see."
                    .to_string(),
            ),

            Self::Api(_) => Some(
                "Check network connectivity and token validity with `taskmark auth`".to_string(),
            ),

            Self::Config(_)
            | Self::InvalidArgument(_)
            | Self::Document { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, exit code, and optional recovery
    /// hint. Scripts parse this instead of stderr text.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotConfigured.exit_code(), 2);
        assert_eq!(
            Error::SourceNotFound {
                name: "x".to_string()
            }
            .exit_code(),
            3
        );
        assert_eq!(Error::Api("boom".to_string()).exit_code(), 5);
        assert_eq!(Error::Other("?".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let json = Error::NotConfigured.to_structured_json();
        assert_eq!(json["error"]["code"], "NOT_CONFIGURED");
        assert!(json["error"]["hint"].as_str().unwrap().contains("init"));
    }
}
