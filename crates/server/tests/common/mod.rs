//! Common test utilities for driving the router in-process.
//!
//! The fixture builds real core components pointed at either an unreachable
//! address or an in-process mock upstream, so no external service is needed.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use tabsync_core::config::{CatalogConfig, DeliveryConfig, SearchConfig, StoreConfig};
use tabsync_core::{Config, WebhookStore};

/// Address nothing listens on.
pub const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Test fixture wrapping the application router.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health() {
///     let fixture = TestFixture::new().await;
///     let response = fixture.get("/api/health").await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Temporary directory holding the webhook destination file
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Null` when empty or not JSON.
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Fixture whose upstreams are all unreachable.
    pub async fn new() -> Self {
        Self::with_upstream(UNREACHABLE).await
    }

    /// Fixture whose catalog and search page live at `base`.
    pub async fn with_upstream(base: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store_path = temp_dir.path().join("webhook-config.json");

        let config = Config {
            catalog: CatalogConfig {
                api_base_url: base.to_string(),
                timeout_secs: 5,
                ..Default::default()
            },
            search: SearchConfig {
                search_page_url: format!("{}/search.php", base),
                timeout_secs: 5,
                ..Default::default()
            },
            delivery: DeliveryConfig {
                timeout_secs: 5,
                max_retries: 2,
                initial_interval_ms: 5,
                max_interval_ms: 20,
                max_elapsed_secs: 10,
                ..Default::default()
            },
            store: StoreConfig { path: store_path.clone() },
            ..Default::default()
        };

        let store = WebhookStore::open(Some(store_path)).await;
        let state = tabsync_server::state::AppState::from_config(config, store)
            .expect("Failed to build app state");
        let router = tabsync_server::api::create_router(Arc::new(state));

        Self { router, temp_dir }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
            text,
        }
    }
}

/// Start `router` on `127.0.0.1:0` and return its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test upstream failed");
    });

    format!("http://{}", addr)
}

/// Bodies received by a mock webhook consumer.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    bodies: Arc<Mutex<Vec<Value>>>,
}

impl Inbox {
    pub fn push(&self, body: Value) {
        self.bodies.lock().unwrap().push(body);
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

/// Assert response status with helpful error message
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $expected:expr) => {
        assert_eq!(
            $response.status,
            $expected,
            "Expected status {}, got {}. Body: {}",
            $expected,
            $response.status,
            $response.text
        );
    };
}

/// Assert JSON field value
#[macro_export]
macro_rules! assert_json_path {
    ($response:expr, $path:expr, $expected:expr) => {
        let value = $response
            .body
            .pointer($path)
            .unwrap_or_else(|| panic!("Path {} not found in {}", $path, $response.body));
        assert_eq!(value, &serde_json::json!($expected), "At path {}", $path);
    };
}
