//! Error types for the murmur service.

/// Top-level error type for the journal analysis service.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// Request validation error (missing transcript or credential).
    #[error("validation error: {0}")]
    Validation(String),

    /// Remote model call failure (timeout, non-2xx status, malformed or
    /// empty response body).
    #[error("inference error: {0}")]
    Inference(String),

    /// Prompt template parse error.
    #[error("template error: {0}")]
    Template(String),

    /// Configuration or static resource error.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP server error (bind, local address).
    #[error("server error: {0}")]
    Server(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, JournalError>;
