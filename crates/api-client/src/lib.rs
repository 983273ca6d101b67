//! Authenticated request client for the campus-stay marketplace API
//!
//! Every feature module talks to the backend through `ApiClient`, which
//! wraps each call in two steps:
//! - `pipeline::attach_credentials` adds the stored access token as a bearer
//!   credential
//! - `pipeline::classify` sorts the outcome into success, a classified
//!   error, or a first 401 that is handed to the refresh-and-retry cycle
//!
//! Failure policy:
//! - no response (including timeouts): `ClientError::Network`, status 0
//! - non-401 failure status: `ClientError::Http` with the original body
//! - 401 on a first attempt: refresh once and retry; if refresh is
//!   impossible or fails, clear the session, redirect to sign-up unless
//!   already on an auth route, and surface the original 401
//! - 401 on a retried attempt: `ClientError::Http`, no further refresh

pub mod client;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod refresh;
pub mod request;
pub mod transport;

pub use client::{
    ApiClient, ApiClientBuilder, ApiResponse, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, ResponseBody,
};
pub use error::{ClientError, Result};
pub use pipeline::{NETWORK_ERROR_MESSAGE, NETWORK_ERROR_STATUS};
pub use request::{AttemptContext, RequestDescriptor, RequestOptions, ResponseType};
pub use transport::{
    RawResponse, ReqwestTransport, Transport, TransportError, TransportErrorKind, TransportResult,
};
