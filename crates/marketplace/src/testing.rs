//! Local axum backend for resource tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_client::{ApiClient, ReqwestTransport};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use session::{Location, MemoryTokenStore};
use tokio::net::TcpListener;

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub(crate) struct Seen {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub bearer: Option<String>,
    pub body: Value,
}

/// A canned answer for one method and path.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    method: Method,
    path: &'static str,
    status: StatusCode,
    body: Value,
}

pub(crate) fn route(method: Method, path: &'static str, status: u16, body: Value) -> Route {
    Route {
        method,
        path,
        status: StatusCode::from_u16(status).unwrap(),
        body,
    }
}

/// Answers from the route table; anything unmatched is a 404.
pub(crate) struct Backend {
    base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
    _server: tokio::task::JoinHandle<()>,
}

impl Backend {
    pub(crate) async fn start(routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let routes = Arc::new(routes);

        let server = tokio::spawn(async move {
            let app = axum::Router::new().fallback(move |request: Request<Body>| {
                let log = log.clone();
                let routes = routes.clone();
                async move {
                    let (parts, body) = request.into_parts();
                    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
                    let path = parts
                        .uri
                        .path()
                        .strip_prefix("/api")
                        .unwrap_or(parts.uri.path())
                        .to_string();
                    log.lock().unwrap().push(Seen {
                        method: parts.method.clone(),
                        path: path.clone(),
                        query: parts.uri.query().unwrap_or("").to_string(),
                        bearer: parts
                            .headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.strip_prefix("Bearer "))
                            .map(str::to_string),
                        body: serde_json::from_slice(&bytes).unwrap_or(Value::Null),
                    });

                    match routes
                        .iter()
                        .find(|r| r.method == parts.method && r.path == path)
                    {
                        Some(r) => (r.status, axum::Json(r.body.clone())),
                        None => (
                            StatusCode::NOT_FOUND,
                            axum::Json(serde_json::json!({"message": "not found"})),
                        ),
                    }
                }
            });
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        Self {
            base_url: format!("http://{addr}/api"),
            seen,
            _server: server,
        }
    }

    pub(crate) fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn client(&self, store: Arc<MemoryTokenStore>) -> ApiClient {
        self.client_at(store, Arc::new(Location::new("/dashboard")))
    }

    pub(crate) fn client_at(&self, store: Arc<MemoryTokenStore>, location: Arc<Location>) -> ApiClient {
        ApiClient::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(5))
            .token_store(store)
            .navigator(location)
            .transport(Arc::new(ReqwestTransport::default()))
            .build()
            .unwrap()
    }
}

/// A store holding a valid-looking session.
pub(crate) fn signed_in() -> Arc<MemoryTokenStore> {
    Arc::new(MemoryTokenStore::with_tokens("A1", Some("R1")))
}
