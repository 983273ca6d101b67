//! Error types for marketplace operations

use api_client::ClientError;

/// Errors from marketplace operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("session storage error: {0}")]
    Session(#[from] session::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Client(e) => e.message(),
            other => other.to_string(),
        }
    }
}

/// Result alias for marketplace operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_show_server_message() {
        let err = Error::from(ClientError::Http {
            status: 422,
            body: serde_json::json!({"message": "Listing is fully booked"}),
        });
        assert_eq!(err.user_message(), "Listing is fully booked");
    }

    #[test]
    fn input_errors_describe_the_problem() {
        let err = Error::InvalidInput("rating must be between 1 and 5".into());
        assert_eq!(err.user_message(), "invalid input: rating must be between 1 and 5");
    }
}
