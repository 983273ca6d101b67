//! Access token refresh
//!
//! POSTs to the refresh endpoint with the refresh token as the bearer
//! credential. This call goes straight to the transport: the stored access
//! token is never attached, and a failure here is not itself refreshed.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use session::REFRESH_PATH;

use crate::pipeline::set_bearer;
use crate::request::{RequestDescriptor, ResponseType};
use crate::transport::Transport;

/// Body returned by the refresh endpoint. Other fields are ignored.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Why a refresh attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh request failed: {0}")]
    Transport(String),

    #[error("refresh endpoint returned {status}")]
    Rejected { status: u16 },

    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    #[error("refresh token cannot be sent as a header")]
    InvalidToken,
}

/// Exchange a refresh token for a new access token.
///
/// Only the access token is returned; the refresh token stays as it was.
pub async fn refresh_access_token(
    transport: &dyn Transport,
    base_url: &str,
    refresh_token: &str,
    timeout: Duration,
) -> Result<String, RefreshError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if !set_bearer(&mut headers, refresh_token) {
        return Err(RefreshError::InvalidToken);
    }

    let request = RequestDescriptor {
        request_id: uuid::Uuid::new_v4().to_string(),
        method: Method::POST,
        url: format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH),
        headers,
        query: Vec::new(),
        body: None,
        timeout,
        response_type: ResponseType::Json,
    };

    let response = transport
        .send(&request)
        .await
        .map_err(|e| RefreshError::Transport(e.to_string()))?;

    if !response.is_success() {
        return Err(RefreshError::Rejected {
            status: response.status,
        });
    }

    let parsed: RefreshResponse = serde_json::from_slice(&response.body)
        .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
    if parsed.access_token.is_empty() {
        return Err(RefreshError::InvalidResponse("empty access_token".into()));
    }
    Ok(parsed.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_response_deserializes() {
        let json = r#"{"access_token":"A2","token_type":"bearer"}"#;
        let parsed: RefreshResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.access_token, "A2");
    }

    #[test]
    fn refresh_response_requires_access_token() {
        let result = serde_json::from_str::<RefreshResponse>(r#"{"token":"A2"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn refresh_error_display() {
        assert_eq!(
            RefreshError::Rejected { status: 403 }.to_string(),
            "refresh endpoint returned 403"
        );
    }
}
