//! Access token inspection
//!
//! Reads the payload segment of a JWT access token so the client can report
//! who is signed in and when the token lapses. The signature is not checked;
//! the server remains the authority on whether a token is valid.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Claims the marketplace backend puts in its access tokens. All optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<serde_json::Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiry as unix seconds
    #[serde(default)]
    pub exp: Option<u64>,
}

impl TokenClaims {
    /// Seconds until expiry relative to `now_secs`; negative once expired.
    /// `None` when there is no expiry or it is outside the `i64` range.
    pub fn expires_in(&self, now_secs: u64) -> Option<i64> {
        let exp = i64::try_from(self.exp?).ok()?;
        let now = i64::try_from(now_secs).ok()?;
        exp.checked_sub(now)
    }

    pub fn is_expired(&self, now_secs: u64) -> bool {
        self.expires_in(now_secs).is_some_and(|secs| secs <= 0)
    }
}

/// Decode the claims segment of a JWT.
pub fn decode_claims(token: &str) -> Result<TokenClaims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) if segments.next().is_none() => payload,
        _ => {
            return Err(Error::MalformedToken(
                "expected three dot-separated segments".into(),
            ));
        }
    };

    // Some issuers pad their segments; URL_SAFE_NO_PAD rejects padding
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| Error::MalformedToken(format!("payload is not base64url: {e}")))?;

    serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedToken(format!("payload is not a claims object: {e}")))
}
