//! Error types for Alfred

use thiserror::Error;

/// Result type alias using Alfred's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Alfred
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or incomplete settings or secrets
    #[error("Configuration error: {0}")]
    Config(String),

    /// The agent's context window was exceeded
    #[error("Context capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// The input channel could not produce text
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// The conversational agent failed to produce a reply
    #[error("Agent error: {0}")]
    Agent(String),

    /// A tool invocation failed
    #[error("Tool error: {0}")]
    Tool(String),

    /// An upstream API answered with an error status
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input channel has no more utterances (e.g. stdin closed)
    #[error("Input channel closed")]
    InputClosed,

    /// The operation was cancelled by shutdown
    #[error("Cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the error ends the dialogue loop instead of a single turn
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Error::Cancelled | Error::InputClosed)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid URL: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_classification() {
        assert!(Error::Cancelled.is_shutdown());
        assert!(Error::InputClosed.is_shutdown());
        assert!(!Error::Agent("boom".into()).is_shutdown());
        assert!(!Error::Config("missing".into()).is_shutdown());
    }
}
