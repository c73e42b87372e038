//! In-process HTTP upstreams for integration tests.
//!
//! Each test builds an axum router playing the catalog, the bypass proxy, the
//! search page or the webhook consumer, and binds it to an ephemeral port.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::http::HeaderMap;
use axum::Router;

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

/// A request seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Shared log of requests received by a mock upstream.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, path: &str, query: Option<&str>, headers: &HeaderMap, body: &str) {
        self.requests.lock().unwrap().push(Recorded {
            path: path.to_string(),
            query: query.unwrap_or_default().to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}
