//! Error types for Shepherd.
//!
//! The control endpoint speaks plain text, so every error that can reach a
//! caller also knows its fixed response string (see [`ShepherdError::response_text`]).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Shepherd library.
#[derive(Debug, Error)]
pub enum ShepherdError {
    // Resource errors
    #[error("port resource exhausted")]
    PortExhausted,

    #[error("Port {0} is already held by a live viewer")]
    PortInUse(u16),

    // Validation errors
    #[error("Invalid tool type: {0:?}")]
    InvalidToolType(String),

    #[error("Invalid port: {0:?}")]
    InvalidPort(String),

    // Process errors
    #[error("Process launch failed for {program}: {message}")]
    LaunchFailed { program: String, message: String },

    #[error("Cannot find executable tool: {0}")]
    ToolNotFound(String),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },
}

/// Result type alias for Shepherd operations.
pub type Result<T> = std::result::Result<T, ShepherdError>;

impl From<std::io::Error> for ShepherdError {
    fn from(err: std::io::Error) -> Self {
        ShepherdError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl ShepherdError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ShepherdError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// The single-line text returned to `/api` callers for this error.
    ///
    /// These strings are part of the endpoint contract and must not change.
    /// A port collision is reported the same way as exhaustion: from the
    /// caller's side the allocator failed to produce a usable port.
    pub fn response_text(&self) -> String {
        match self {
            ShepherdError::PortExhausted | ShepherdError::PortInUse(_) => {
                "port resource exhausted".to_string()
            }
            ShepherdError::InvalidToolType(_) => "invalid tool type".to_string(),
            ShepherdError::InvalidPort(_) => "invalid port".to_string(),
            ShepherdError::LaunchFailed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
