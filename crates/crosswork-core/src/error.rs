//! Error types and exit codes for crosswork
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args/payloads)
//! - 3: Data/store error (missing store, missing row, invalid state)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the crosswork CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/store error - missing store, missing row (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during crosswork operations
#[derive(Error, Debug)]
pub enum CoreError {
    // Usage errors (exit code 2)
    #[error("{0}")]
    UsageError(String),

    #[error("invalid {context}: {value}")]
    InvalidValue { context: String, value: String },

    // Data/store errors (exit code 3)
    #[error("store not found (searched from {search_root:?})")]
    StoreNotFound { search_root: PathBuf },

    #[error("{context} not found: {value}")]
    NotFound { context: String, value: String },

    #[error("{context} already exists: {value}")]
    AlreadyExists { context: String, value: String },

    #[error("invalid state for {context}: {reason}")]
    InvalidState { context: String, reason: String },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("migration {version} failed: {reason}")]
    MigrationFailed { version: String, reason: String },

    #[error("failed to {operation}: {reason}")]
    FailedOperation { operation: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Other(err.to_string())
    }
}

impl CoreError {
    /// Create an error for a failed database operation
    pub fn db_operation(operation: &str, error: impl std::fmt::Display) -> Self {
        CoreError::FailedOperation {
            operation: operation.to_string(),
            reason: error.to_string(),
        }
    }

    /// Create an error for an invalid value or payload field
    pub fn invalid_value(context: &str, value: impl std::fmt::Display) -> Self {
        CoreError::InvalidValue {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an entity that was not found
    pub fn not_found(context: &str, value: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an entity that already exists
    pub fn already_exists(context: &str, value: impl std::fmt::Display) -> Self {
        CoreError::AlreadyExists {
            context: context.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an error for an operation attempted in the wrong lifecycle state
    pub fn invalid_state(context: &str, reason: impl std::fmt::Display) -> Self {
        CoreError::InvalidState {
            context: context.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CoreError::UsageError(_) | CoreError::InvalidValue { .. } => ExitCode::Usage,

            CoreError::StoreNotFound { .. }
            | CoreError::NotFound { .. }
            | CoreError::AlreadyExists { .. }
            | CoreError::InvalidState { .. } => ExitCode::Data,

            CoreError::Io(_)
            | CoreError::Json(_)
            | CoreError::Toml(_)
            | CoreError::MigrationFailed { .. }
            | CoreError::FailedOperation { .. }
            | CoreError::Other(_) => ExitCode::Failure,
        }
    }

    /// Get the error type identifier used in structured output
    fn error_type(&self) -> &'static str {
        match self {
            CoreError::UsageError(_) => "usage_error",
            CoreError::InvalidValue { .. } => "invalid_value",
            CoreError::StoreNotFound { .. } => "store_not_found",
            CoreError::NotFound { .. } => "not_found",
            CoreError::AlreadyExists { .. } => "already_exists",
            CoreError::InvalidState { .. } => "invalid_state",
            CoreError::Io(_) => "io_error",
            CoreError::Json(_) => "json_error",
            CoreError::Toml(_) => "toml_error",
            CoreError::MigrationFailed { .. } => "migration_failed",
            CoreError::FailedOperation { .. } => "failed_operation",
            CoreError::Other(_) => "other",
        }
    }

    /// Convert error to JSON representation for structured error output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }
}

/// Result type alias for crosswork operations
pub type Result<T> = std::result::Result<T, CoreError>;
