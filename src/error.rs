//! Error types for the ZFS control plane
//!
//! Every public operation returns [`Result`]. Errors carry the operation and
//! target they belong to, so callers can surface them without extra context.

use std::time::Duration;
use thiserror::Error;

/// Failure of a single external command invocation
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("failed to start [{command}]: {source}")]
    Start {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[{command}] exited with {}: {}", exit_status(.status), .stderr.trim())]
    Failed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("[{command}] timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

fn exit_status(status: &Option<i32>) -> String {
    status
        .map(|code| code.to_string())
        .unwrap_or_else(|| "signal".to_string())
}

/// Unified error type for the control plane
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation failed: {0}")]
    Validation(String),

    // =========================================================================
    // Execution Errors
    // =========================================================================
    #[error("{operation} failed for {target}: {source}")]
    Execution {
        operation: String,
        target: String,
        #[source]
        source: ExecutionError,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("Output parse error: {0}")]
    Parse(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error("{kind} not found: {name}")]
    NotFound { kind: String, name: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input, rejected before any command ran
    Validation,
    /// The storage tool failed, was unreachable, or timed out
    Execution,
    /// The tool's output did not match the expected schema
    Parse,
    /// The referenced pool, dataset, or snapshot does not exist
    Domain,
    /// Configuration or local I/O problems
    Internal,
}

impl Error {
    /// Shorthand for a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Shorthand for a not-found error
    pub fn not_found(kind: &str, name: &str) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        }
    }

    /// Wrap a command failure with the operation and target it served
    pub fn execution(operation: &str, target: &str, source: ExecutionError) -> Self {
        Error::Execution {
            operation: operation.to_string(),
            target: target.to_string(),
            source,
        }
    }

    /// Determine which part of the taxonomy this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation(_) => ErrorCategory::Validation,
            Error::Execution { .. } => ErrorCategory::Execution,
            Error::Parse(_) | Error::Json(_) => ErrorCategory::Parse,
            Error::NotFound { .. } => ErrorCategory::Domain,
            Error::Configuration(_) | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    /// Whether the caller can recover by correcting its input
    pub fn is_caller_fixable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Validation | ErrorCategory::Domain
        )
    }

    /// Whether the external command hit the caller-level timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Execution {
                source: ExecutionError::Timeout { .. },
                ..
            }
        )
    }
}

/// Result type alias for the control plane
pub type Result<T> = std::result::Result<T, Error>;
