//! Error types for session-monitor

use crate::SessionStatus;
use thiserror::Error;

/// Main error type for the session-monitor library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No platform config directory to store preferences in
    #[error("config directory not found")]
    ConfigDirNotFound,

    /// A transition table entry with no candidates
    #[error("transition table has no candidates for {0:?}")]
    EmptyTransitions(SessionStatus),

    /// Backend deliberately unavailable (used by test stores)
    #[error("preference store unavailable")]
    Unavailable,
}

/// Result type alias for session-monitor
pub type Result<T> = std::result::Result<T, Error>;
