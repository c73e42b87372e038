//! Search fallback chain integration tests.
//!
//! One mock upstream plays the catalog API, the public search page and the
//! bypass proxy so every tier of the chain can be exercised.

mod common;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use common::{spawn_upstream, Recorder};
use tabsync_core::config::{CatalogConfig, SearchConfig};
use tabsync_core::{RequestSigner, SearchEngine, SearchError, SearchQuery};

/// How the mock upstream behaves.
#[derive(Clone)]
struct Upstream {
    rec: Recorder,
    api: Option<Value>,
    page: Option<String>,
    proxy: Option<Value>,
}

async fn api_endpoint(State(up): State<Upstream>, uri: Uri, headers: HeaderMap) -> Response {
    up.rec.record(uri.path(), uri.query(), &headers, "");
    match (&up.api, uri.path()) {
        (Some(body), "/search") => Json(body.clone()).into_response(),
        (_, "/suggest") => (StatusCode::FORBIDDEN, "denied").into_response(),
        _ => Json(json!({})).into_response(),
    }
}

async fn search_page(State(up): State<Upstream>, uri: Uri, headers: HeaderMap) -> Response {
    up.rec.record(uri.path(), uri.query(), &headers, "");
    match &up.page {
        Some(html) => html.clone().into_response(),
        None => (StatusCode::FORBIDDEN, "Just a moment...").into_response(),
    }
}

async fn proxy(State(up): State<Upstream>, uri: Uri, headers: HeaderMap, body: String) -> Response {
    up.rec.record(uri.path(), uri.query(), &headers, &body);
    match &up.proxy {
        Some(reply) => Json(reply.clone()).into_response(),
        None => (StatusCode::INTERNAL_SERVER_ERROR, "proxy down").into_response(),
    }
}

async fn start(up: Upstream, with_proxy: bool) -> SearchEngine {
    let router = Router::new()
        .route("/suggest", get(api_endpoint))
        .route("/tab-search", get(api_endpoint))
        .route("/search", get(api_endpoint))
        .route("/search.php", get(search_page))
        .route("/v1", post(proxy))
        .with_state(up);
    let base = spawn_upstream(router).await;

    let catalog = CatalogConfig {
        api_base_url: base.clone(),
        ..Default::default()
    };
    let search = SearchConfig {
        search_page_url: format!("{}/search.php", base),
        bypass_proxy_url: with_proxy.then(|| base.clone()),
        ..Default::default()
    };
    let signer = Arc::new(RequestSigner::with_device_id("0123456789abcdef", "UGT_TEST/1.0"));

    SearchEngine::new(&search, &catalog, signer).expect("Failed to build engine")
}

fn store_page(results: Value) -> String {
    let json = json!({"store": {"page": {"data": {"results": results}}}}).to_string();
    let encoded = json.replace('&', "&amp;").replace('"', "&quot;");
    format!(
        r#"<!doctype html><html><body><div class="js-store" data-content="{}"></div></body></html>"#,
        encoded
    )
}

fn anchors_page() -> String {
    r#"<html><body>
        <a href="https://tabs.example.com/tab/radiohead/creep-chords-4169">Creep</a>
        <a href="https://tabs.example.com/tab/radiohead/creep-tabs-4170">Creep</a>
        <a href="https://tabs.example.com/tab/the-verve/bitter-sweet-symphony-chords-9001">Bitter Sweet Symphony</a>
    </body></html>"#
        .to_string()
}

#[tokio::test]
async fn test_api_tier_wins_and_is_signed() {
    let rec = Recorder::new();
    let up = Upstream {
        rec: rec.clone(),
        api: Some(json!({"tabs": [
            {"id": 1, "song_name": "Hurt", "artist_name": "Johnny Cash", "type": "Tab", "rating": 4.9},
            {"id": 2, "song_name": "Hurt", "artist_name": "Johnny Cash", "type": "Chords", "rating": 4.2},
            {"id": 3, "song_name": "Hurt", "artist_name": "Nine Inch Nails", "type": "Chords", "rating": 4.7}
        ]})),
        page: None,
        proxy: None,
    };
    let engine = start(up, false).await;

    let mut results = engine.search(&SearchQuery::new("hurt")).await.unwrap();
    results.sort_by(|a, b| a.id.cmp(&b.id));

    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3"]);

    // suggest (403) -> tab-search (empty) -> search (hit); page never fetched
    assert_eq!(rec.paths(), vec!["/suggest", "/tab-search", "/search"]);
    for req in rec.requests() {
        assert_eq!(req.header("x-ug-client-id"), Some("0123456789abcdef"));
        assert!(req.header("x-ug-api-key").is_some());
    }
}

#[tokio::test]
async fn test_type_filter_forwarded() {
    let rec = Recorder::new();
    let up = Upstream {
        rec: rec.clone(),
        api: Some(json!({"tabs": [{"id": 9, "song_name": "X", "artist_name": "Y", "type": "Chords"}]})),
        page: None,
        proxy: None,
    };
    let engine = start(up, false).await;

    engine
        .search(&SearchQuery::new("x").with_type("chords"))
        .await
        .unwrap();

    for req in rec.requests() {
        assert!(req.query.ends_with("&type=chords"), "query was {}", req.query);
    }
}

#[tokio::test]
async fn test_embedded_json_tier() {
    let rec = Recorder::new();
    let up = Upstream {
        rec: rec.clone(),
        api: None,
        page: Some(store_page(json!([
            {"id": 31, "song_name": "Zombie", "artist_name": "The Cranberries", "type": "Chords", "rating": 4.8, "tab_url": "https://x/31"},
            {"id": 32, "song_name": "Linger", "artist_name": "The Cranberries", "type": "Chords", "rating": 4.9, "tab_url": "https://x/32"}
        ]))),
        proxy: None,
    };
    let engine = start(up, false).await;

    let results = engine.search(&SearchQuery::new("zombie")).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "32");
    assert_eq!(results[0].url, "https://x/32");

    let page_requests: Vec<_> = rec
        .requests()
        .into_iter()
        .filter(|r| r.path == "/search.php")
        .collect();
    assert_eq!(page_requests.len(), 1);
    assert_eq!(page_requests[0].query, "search_type=title&value=zombie");
    assert!(page_requests[0]
        .header("accept")
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn test_anchor_tier_fetches_page_once() {
    let rec = Recorder::new();
    let up = Upstream {
        rec: rec.clone(),
        api: None,
        page: Some(anchors_page()),
        proxy: None,
    };
    let engine = start(up, false).await;

    let mut results = engine.search(&SearchQuery::new("creep")).await.unwrap();
    results.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "4169");
    assert_eq!(results[0].artist, "Radiohead");
    assert_eq!(results[0].tab_type, "Chords");
    assert_eq!(results[1].artist, "The Verve");

    let page_fetches = rec.paths().iter().filter(|p| *p == "/search.php").count();
    assert_eq!(page_fetches, 1);
}

#[tokio::test]
async fn test_proxy_renders_page() {
    let rec = Recorder::new();
    let up = Upstream {
        rec: rec.clone(),
        api: None,
        page: None,
        proxy: Some(json!({
            "status": "ok",
            "message": "",
            "solution": {"url": "https://tabs.example.com/search.php", "status": 200, "response": anchors_page()}
        })),
    };
    let engine = start(up, true).await;

    let results = engine.search(&SearchQuery::new("creep")).await.unwrap();
    assert_eq!(results.len(), 2);

    let proxy_requests: Vec<_> = rec.requests().into_iter().filter(|r| r.path == "/v1").collect();
    assert_eq!(proxy_requests.len(), 1);
    let body: Value = serde_json::from_str(&proxy_requests[0].body).unwrap();
    assert_eq!(body["cmd"], "request.get");
    assert_eq!(body["maxTimeout"], 60000);
    assert!(body["url"].as_str().unwrap().contains("/search.php?search_type=title&value=creep"));

    // Direct fetch not needed
    assert!(!rec.paths().iter().any(|p| p == "/search.php"));
}

#[tokio::test]
async fn test_proxy_failure_falls_back_to_direct() {
    let rec = Recorder::new();
    let up = Upstream {
        rec: rec.clone(),
        api: None,
        page: Some(anchors_page()),
        proxy: Some(json!({"status": "error", "message": "challenge not solved"})),
    };
    let engine = start(up, true).await;

    let results = engine.search(&SearchQuery::new("creep")).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(rec.paths().iter().any(|p| p == "/v1"));
    assert!(rec.paths().iter().any(|p| p == "/search.php"));
}

#[tokio::test]
async fn test_everything_blocked_is_no_results() {
    let up = Upstream {
        rec: Recorder::new(),
        api: None,
        page: None,
        proxy: None,
    };
    let engine = start(up, true).await;

    let err = engine.search(&SearchQuery::new("anything")).await.unwrap_err();
    assert!(matches!(err, SearchError::NoResults));
}

#[tokio::test]
async fn test_difficulty_filter() {
    let up = Upstream {
        rec: Recorder::new(),
        api: Some(json!({"data": {"results": [
            {"id": "1", "song_name": "A", "artist_name": "X", "type": "Chords", "rating": 5.0, "difficulty": "advanced"},
            {"id": "2", "song_name": "A", "artist_name": "X", "type": "Chords", "rating": 3.0, "difficulty": "novice"},
            {"id": "3", "song_name": "B", "artist_name": "Y", "type": "Chords", "rating": 3.0}
        ]}})),
        page: None,
        proxy: None,
    };
    let engine = start(up, false).await;

    let mut results = engine
        .search(&SearchQuery::new("a").with_difficulty("novice"))
        .await
        .unwrap();
    results.sort_by(|a, b| a.id.cmp(&b.id));

    let ids: Vec<_> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "3"]);
}
