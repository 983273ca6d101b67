//! Request and response pipelines
//!
//! `attach_credentials` runs on every request the client dispatches.
//! `classify` turns the transport result into one of three outcomes:
//! pass the response through, fail with a classified error, or hand a first
//! 401 to the refresh step in `client.rs`.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use session::TokenStore;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::request::{AttemptContext, RequestDescriptor};
use crate::transport::{RawResponse, TransportResult};

/// Message carried by every `ClientError::Network`.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: unable to reach the server. Please check your connection and try again.";

/// Status reported for requests that got no response.
pub const NETWORK_ERROR_STATUS: u16 = 0;

/// Attach the stored access token as a bearer credential.
///
/// Replaces any Authorization header already on the request. With no stored
/// token the request goes out unauthenticated and the headers are left alone.
pub fn attach_credentials(request: &mut RequestDescriptor, store: &dyn TokenStore) {
    let credentials = store.get();
    match credentials.access_token() {
        Some(token) => {
            set_bearer(&mut request.headers, token);
        }
        None => debug!("no access token, sending unauthenticated"),
    }
}

/// Set `Authorization: Bearer <token>`. A token that cannot be carried in a
/// header is logged and skipped.
pub(crate) fn set_bearer(headers: &mut HeaderMap, token: &str) -> bool {
    match HeaderValue::from_str(&format!("Bearer {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            true
        }
        Err(e) => {
            warn!(error = %e, "stored token is not a valid header value, skipping");
            false
        }
    }
}

/// Classification of one dispatched attempt.
#[derive(Debug)]
pub enum Outcome {
    /// 2xx; passed through unchanged.
    Success(RawResponse),
    /// Terminal failure for this call.
    Failed(ClientError),
    /// A 401 on a first attempt. Carries the error to surface if the session
    /// cannot be recovered.
    Unauthorized(ClientError),
}

impl Outcome {
    /// Label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Success(_) => "success",
            Outcome::Failed(ClientError::Network { .. }) => "network_error",
            Outcome::Failed(_) => "http_error",
            Outcome::Unauthorized(_) => "unauthorized",
        }
    }
}

/// Classify the result of one attempt.
pub fn classify(result: TransportResult, attempt: AttemptContext) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            debug!(kind = ?e.kind, error = %e.message, "no response received");
            return Outcome::Failed(ClientError::network());
        }
    };

    if response.is_success() {
        return Outcome::Success(response);
    }

    let status = response.status;
    let error = http_error(&response);
    if status == 401 && !attempt.retried {
        Outcome::Unauthorized(error)
    } else {
        Outcome::Failed(error)
    }
}

/// Build an `Http` error carrying the response's status and body.
///
/// JSON bodies are kept as parsed; anything else is kept as text.
pub fn http_error(response: &RawResponse) -> ClientError {
    ClientError::Http {
        status: response.status,
        body: error_body(&response.body),
    }
}

fn error_body(bytes: &[u8]) -> serde_json::Value {
    if bytes.is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
    })
}
