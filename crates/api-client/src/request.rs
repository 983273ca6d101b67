//! Outgoing request descriptors and per-call options

use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap};

/// How the body of a successful response should be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseType {
    #[default]
    Json,
    Text,
    Bytes,
}

/// Per-call options: extra headers, query parameters, and response type.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub response_type: ResponseType,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Add a query parameter only when `value` is present.
    pub fn query_opt<V: ToString>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(name, v),
            None => self,
        }
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

/// One request as it will be handed to the transport.
///
/// Built per call with the base URL already applied. The credential step
/// mutates `headers` before each dispatch.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub request_id: String,
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
    pub response_type: ResponseType,
}

impl RequestDescriptor {
    /// The bearer credential currently attached, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// Which attempt a dispatch belongs to.
///
/// Threaded through the dispatch instead of being stored on the request. A
/// retried attempt never triggers another refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptContext {
    pub retried: bool,
}

impl AttemptContext {
    pub fn first() -> Self {
        Self { retried: false }
    }

    pub fn retry() -> Self {
        Self { retried: true }
    }
}
