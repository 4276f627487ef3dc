//! Error types for KantanPress.
//!
//! Library crates use [`KantanError`] via `thiserror`.
//! The CLI app wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all KantanPress operations.
#[derive(Debug, thiserror::Error)]
pub enum KantanError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP transport error during fetch or upload.
    #[error("network error: {0}")]
    Network(String),

    /// The CMS API responded, but with an error or unexpected payload.
    #[error("API error: {message}")]
    Api { message: String },

    /// JSON (de)serialization error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing collections, bad field values, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Site generator spawn/exit failure.
    #[error("build error: {0}")]
    Build(String),

    /// ZIP archive creation failure.
    #[error("archive error: {0}")]
    Archive(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, KantanError>;

impl KantanError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an API error from any displayable message.
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = KantanError::config("missing project id");
        assert_eq!(err.to_string(), "config error: missing project id");

        let err = KantanError::validation("collection Blog not found");
        assert!(err.to_string().contains("Blog"));
    }

    #[test]
    fn build_error_carries_exit_code() {
        let err = KantanError::Build("mkdocs exited with status 2".into());
        assert!(err.to_string().contains("status 2"));
    }
}
