//! Classified request errors

use crate::pipeline::{NETWORK_ERROR_MESSAGE, NETWORK_ERROR_STATUS};

/// Errors surfaced to callers of the API client.
///
/// `Network` and `Http` are the two outcomes of a dispatched request that did
/// not succeed. `InvalidRequest` and `Decode` are local failures: the request
/// could not be built, or a success body did not have the expected shape.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// No response was received (connection failure, DNS, timeout).
    #[error("{message}")]
    Network { message: String, status: u16 },

    /// The server responded with a non-success status.
    #[error("request failed with status {status}")]
    Http {
        status: u16,
        body: serde_json::Value,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("response decode error: {0}")]
    Decode(String),
}

impl ClientError {
    /// The fixed error for requests that got no response.
    pub fn network() -> Self {
        ClientError::Network {
            message: NETWORK_ERROR_MESSAGE.to_string(),
            status: NETWORK_ERROR_STATUS,
        }
    }

    /// HTTP status of the failure; 0 when no response was received.
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Network { status, .. } => *status,
            ClientError::Http { status, .. } => *status,
            ClientError::InvalidRequest(_) | ClientError::Decode(_) => 0,
        }
    }

    /// Response body of an HTTP failure.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            ClientError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Http { status: 401, .. })
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }

    /// Message suitable for showing to a user.
    ///
    /// Prefers the server's own `message` (or `error`) field, falling back
    /// to a plain body string, then the status line.
    pub fn message(&self) -> String {
        match self {
            ClientError::Http { status, body } => server_message(body)
                .unwrap_or_else(|| format!("Request failed with status {status}")),
            other => other.to_string(),
        }
    }
}

fn server_message(body: &serde_json::Value) -> Option<String> {
    match body {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        serde_json::Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .map(str::to_owned),
        _ => None,
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
