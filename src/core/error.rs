use std::io;
use thiserror::Error;

/// Unified error type for dolores
#[derive(Error, Debug)]
pub enum DoloresError {
    /// Missing or invalid configuration; fatal before the session starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote chat-completion failures, including transport errors
    #[error("API error: {0}")]
    Api(String),

    /// The shell for a `!` command could not be launched
    #[error("Execution error: {0}")]
    Execution(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The user pressed Ctrl-C while a turn was in flight
    #[error("Interrupted")]
    Interrupted,
}

impl DoloresError {
    /// Errors that end the process instead of a single turn.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DoloresError::Config(_) | DoloresError::Io { .. })
    }
}

impl From<reqwest::Error> for DoloresError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DoloresError::Api(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            DoloresError::Api(format!("Connection failed: {}", err))
        } else if err.is_status() {
            DoloresError::Api(format!("API returned error status: {}", err))
        } else {
            DoloresError::Api(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for DoloresError {
    fn from(err: serde_json::Error) -> Self {
        DoloresError::Serialization(format!("JSON error: {}", err))
    }
}
