//! Error types for session storage

/// Errors from the session store and token inspection.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("session parse error: {0}")]
    Parse(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),
}

/// Result alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
