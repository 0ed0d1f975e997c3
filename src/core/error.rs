//! Error types shared across the crate

use thiserror::Error;

/// Errors that can occur while running an agent session
#[derive(Error, Debug)]
pub enum AgentError {
    /// One or more required environment variables are absent
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    /// A configuration value is present but unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Non-success response from the model API
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A rate-limited call kept failing until the attempt budget ran out
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Tool server failed to start or answer
    #[error("Tool server error: {0}")]
    ToolServer(String),

    /// Tool server handle used after its scope closed
    #[error("Tool server '{0}' is closed")]
    ToolServerClosed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        AgentError::Other(msg.into())
    }

    /// Create a tool server error
    pub fn tool_server(msg: impl Into<String>) -> Self {
        AgentError::ToolServer(msg.into())
    }
}

/// Result type alias for crate operations
pub type AgentResult<T> = Result<T, AgentError>;
