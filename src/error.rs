//! Error types for the career guidance advisor

use thiserror::Error;

/// Result type alias for advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Agent execution error: {0}")]
    AgentExecution(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Indexing error: {0}")]
    Indexing(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // =============================
    // External Library Conversions
    // =============================

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures of the external text generation capability.
///
/// Agents recover from every variant locally; none of them reaches the
/// dispatcher.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("generation request timed out")]
    Timeout,

    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("generation API returned an empty response")]
    EmptyResponse,

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
}

impl GenerationError {
    /// Map a transport error, keeping timeouts distinguishable.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Request(e.to_string())
        }
    }
}
