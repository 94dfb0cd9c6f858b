//! Error types for the agenda client.

use thiserror::Error;

/// Errors that can occur while talking to the agenda backend.
#[derive(Error, Debug)]
pub enum AgendaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Login failed: {0}")]
    LoginRejected(String),

    #[error("{0}")]
    Validation(String),

    #[error("Scheduling conflict: {message}")]
    TimeConflict {
        message: String,
        /// Raw conflict entries as reported by the server, if any.
        conflicts: Vec<serde_json::Value>,
    },

    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AgendaError {
    /// Authentication failures end the session; everything else leaves it alone.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AgendaError::NotAuthenticated | AgendaError::SessionExpired)
    }
}

impl From<serde_json::Error> for AgendaError {
    fn from(err: serde_json::Error) -> Self {
        AgendaError::Serialization(err.to_string())
    }
}

/// Result type alias for agenda operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
