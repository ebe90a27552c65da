//! Structured error types for configuration resolution.

use std::fmt;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Loader errors
    LoadFailure,
    InvalidFragment,

    // Level expansion errors
    GlobFailure,

    // Internal errors
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::LoadFailure => "LOAD_FAILURE",
            ErrorCode::InvalidFragment => "INVALID_FRAGMENT",
            ErrorCode::GlobFailure => "GLOB_FAILURE",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised while materializing or resolving a configuration chain.
///
/// Missing levels, libraries and modules are not errors; those queries
/// return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    #[error("invalid configuration fragment in {}: expected a mapping, found {found}", .path.display())]
    InvalidFragment { path: PathBuf, found: &'static str },

    #[error("failed to expand level pattern '{pattern}' under {}: {message}", .base.display())]
    Glob {
        pattern: String,
        base: PathBuf,
        message: String,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ConfigError {
    pub fn load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn glob(pattern: &str, base: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Glob {
            pattern: pattern.to_string(),
            base: base.into(),
            message: message.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::Load { .. } => ErrorCode::LoadFailure,
            ConfigError::InvalidFragment { .. } => ErrorCode::InvalidFragment,
            ConfigError::Glob { .. } => ErrorCode::GlobFailure,
            ConfigError::Task(_) => ErrorCode::Internal,
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
