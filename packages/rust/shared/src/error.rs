//! Error types for nbsteps.
//!
//! Library crates use [`NbStepsError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all nbsteps operations.
#[derive(Debug, thiserror::Error)]
pub enum NbStepsError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The notebook document could not be read or is not valid nbformat.
    #[error("notebook error: {message}")]
    Notebook { message: String },

    /// The execution collaborator failed, exited non-zero, or timed out.
    #[error("execution error: {0}")]
    Execution(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization of an output document failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Input validation error (missing notebook, bad version string, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NbStepsError>;

impl NbStepsError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a notebook format error from any displayable message.
    pub fn notebook(msg: impl Into<String>) -> Self {
        Self::Notebook {
            message: msg.into(),
        }
    }

    /// Create an execution error from any displayable message.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
