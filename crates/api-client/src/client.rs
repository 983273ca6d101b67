//! Authenticated request client
//!
//! Composes the credential step and the response classifier around a
//! transport call. A first 401 runs one refresh-and-retry cycle:
//!
//! 1. No refresh token stored: end the session, surface the 401
//! 2. Refresh fails: end the session, surface the original 401
//! 3. Refresh succeeds: store the new access token, re-dispatch once with
//!    `AttemptContext::retry()`; whatever that attempt returns is the result
//!
//! Concurrent 401s each run their own cycle. Duplicate refresh calls are
//! possible and accepted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use session::{Location, MemoryTokenStore, Navigator, TokenStore};
use tracing::{debug, info, instrument, warn};

use crate::error::{ClientError, Result};
use crate::metrics;
use crate::pipeline::{self, Outcome};
use crate::refresh;
use crate::request::{AttemptContext, RequestDescriptor, RequestOptions, ResponseType};
use crate::transport::{RawResponse, ReqwestTransport, Transport};

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
    Bytes(Vec<u8>),
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl ApiResponse {
    /// Decode a JSON body into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        match self.body {
            ResponseBody::Json(value) => {
                serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string()))
            }
            ResponseBody::Text(text) => {
                serde_json::from_str(&text).map_err(|e| ClientError::Decode(e.to_string()))
            }
            ResponseBody::Bytes(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
            }
        }
    }
}

/// HTTP client that manages bearer credentials for the marketplace API.
///
/// Cheap to share behind an `Arc`; all state lives in the token store.
pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    token_store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.token_store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Whether the stored access token is a demo token.
    pub fn is_mock_mode(&self) -> bool {
        self.token_store.is_mock_mode()
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::GET, path, None, options).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::POST, path, body, options).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        self.request(Method::PUT, path, body, options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, None, options).await
    }

    /// GET and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.get(path, options).await?.json()
    }

    /// POST a serializable body and decode the JSON response.
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = to_json(body)?;
        self.post(path, Some(body), RequestOptions::default())
            .await?
            .json()
    }

    /// PUT a serializable body and decode the JSON response.
    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let body = to_json(body)?;
        self.put(path, Some(body), RequestOptions::default())
            .await?
            .json()
    }

    /// DELETE and decode the JSON response.
    pub async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.delete(path, RequestOptions::default()).await?.json()
    }

    /// Build and run one request through both pipelines.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> Result<ApiResponse> {
        let request = self.build_request(method, path, body, options);
        self.execute(request).await
    }

    fn build_request(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        options: RequestOptions,
    ) -> RequestDescriptor {
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }
        for (name, value) in &options.headers {
            let name = match HeaderName::from_bytes(name.as_bytes()) {
                Ok(n) => n,
                Err(e) => {
                    warn!(header = %name, error = %e, "skipping invalid header name");
                    continue;
                }
            };
            let value = match HeaderValue::from_str(value) {
                Ok(v) => v,
                Err(e) => {
                    warn!(header = %name, error = %e, "skipping invalid header value");
                    continue;
                }
            };
            headers.insert(name, value);
        }

        RequestDescriptor {
            request_id,
            method,
            url: join_url(&self.base_url, path),
            headers,
            query: options.query,
            body,
            timeout: self.timeout,
            response_type: options.response_type,
        }
    }

    #[instrument(skip_all, fields(request_id = %request.request_id, method = %request.method, url = %request.url))]
    async fn execute(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let (request, outcome) = self.dispatch(request, AttemptContext::first()).await;
        match outcome {
            Outcome::Success(raw) => decode_response(raw, request.response_type),
            Outcome::Failed(err) => Err(err),
            Outcome::Unauthorized(err) if !within_base(&request.url, &self.base_url) => {
                debug!("401 from outside the API base, not refreshing");
                Err(err)
            }
            Outcome::Unauthorized(err) => self.refresh_and_retry(request, err).await,
        }
    }

    /// Attach credentials, send, classify.
    async fn dispatch(
        &self,
        mut request: RequestDescriptor,
        attempt: AttemptContext,
    ) -> (RequestDescriptor, Outcome) {
        if within_base(&request.url, &self.base_url) {
            pipeline::attach_credentials(&mut request, self.token_store.as_ref());
        } else {
            debug!("url outside the API base, sending without stored credentials");
        }
        debug!(retried = attempt.retried, "dispatching request");

        let started = Instant::now();
        let result = self.transport.send(&request).await;
        let outcome = pipeline::classify(result, attempt);

        metrics::record_request(
            request.method.as_str(),
            outcome.label(),
            started.elapsed().as_secs_f64(),
        );
        (request, outcome)
    }

    async fn refresh_and_retry(
        &self,
        mut request: RequestDescriptor,
        unauthorized: ClientError,
    ) -> Result<ApiResponse> {
        let credentials = self.token_store.get();
        let Some(refresh_token) = credentials.refresh_token() else {
            warn!("received 401 with no refresh token, ending session");
            metrics::record_refresh("missing");
            session::end_session(self.token_store.as_ref(), self.navigator.as_ref());
            return Err(unauthorized);
        };

        let refreshed = refresh::refresh_access_token(
            self.transport.as_ref(),
            &self.base_url,
            refresh_token,
            self.timeout,
        )
        .await;

        let access_token = match refreshed {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "token refresh failed, ending session");
                metrics::record_refresh("failure");
                session::end_session(self.token_store.as_ref(), self.navigator.as_ref());
                return Err(unauthorized);
            }
        };

        if let Err(e) = self.token_store.set(&access_token, None) {
            warn!(error = %e, "failed to persist refreshed access token");
        }
        pipeline::set_bearer(&mut request.headers, &access_token);
        metrics::record_refresh("success");
        info!("access token refreshed, retrying request");

        let (request, outcome) = self.dispatch(request, AttemptContext::retry()).await;
        match outcome {
            Outcome::Success(raw) => decode_response(raw, request.response_type),
            Outcome::Failed(err) | Outcome::Unauthorized(err) => Err(err),
        }
    }
}

/// Builder for `ApiClient`.
///
/// Unset parts default to an in-memory store, a navigator at `/`, and a
/// reqwest transport.
pub struct ApiClientBuilder {
    base_url: String,
    timeout: Duration,
    token_store: Option<Arc<dyn TokenStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            token_store: None,
            navigator: None,
            transport: None,
        }
    }
}

impl ApiClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ClientError::InvalidRequest(format!(
                "base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidRequest(
                "timeout must be greater than 0".into(),
            ));
        }

        Ok(ApiClient {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
            token_store: self
                .token_store
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
            navigator: self
                .navigator
                .unwrap_or_else(|| Arc::new(Location::default())),
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::default())),
        })
    }
}

/// Join a request path onto the base URL. Absolute URLs are used as given.
fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Whether `url` addresses the API itself. Only these requests carry the
/// stored credentials.
fn within_base(url: &str, base_url: &str) -> bool {
    match url.strip_prefix(base_url) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
        None => false,
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value> {
    serde_json::to_value(body)
        .map_err(|e| ClientError::InvalidRequest(format!("failed to serialize body: {e}")))
}

/// Read a 2xx body according to the requested response type.
fn decode_response(raw: RawResponse, response_type: ResponseType) -> Result<ApiResponse> {
    let body = match response_type {
        ResponseType::Json if raw.body.is_empty() => ResponseBody::Json(serde_json::Value::Null),
        ResponseType::Json => ResponseBody::Json(
            serde_json::from_slice(&raw.body)
                .map_err(|e| ClientError::Decode(format!("invalid JSON response: {e}")))?,
        ),
        ResponseType::Text => ResponseBody::Text(String::from_utf8_lossy(&raw.body).into_owned()),
        ResponseType::Bytes => ResponseBody::Bytes(raw.body),
    };
    Ok(ApiResponse {
        status: raw.status,
        headers: raw.headers,
        body,
    })
}
