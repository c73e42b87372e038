//! Authenticated catalog API search.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::catalog::{body_excerpt, RequestSigner};
use crate::config::CatalogConfig;

use super::{SearchContext, SearchError, SearchQuery, SearchResult, SearchStrategy};

/// Endpoint path and query parameter name, probed in order.
const ENDPOINTS: &[(&str, &str)] = &[
    ("suggest", "value"),
    ("tab-search", "query"),
    ("search", "title"),
];

/// Search through the signed catalog API endpoints.
pub struct ApiSearch {
    client: Client,
    base_url: String,
    signer: Arc<RequestSigner>,
}

impl ApiSearch {
    pub fn new(config: &CatalogConfig, signer: Arc<RequestSigner>) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// Endpoint URLs for a query, in probe order.
    fn endpoint_urls(&self, query: &SearchQuery) -> Vec<String> {
        let encoded = urlencoding::encode(query.query.trim());
        ENDPOINTS
            .iter()
            .map(|(path, param)| {
                let mut url = format!("{}/{}?{}={}", self.base_url, path, param, encoded);
                if let Some(tab_type) = query.type_filter() {
                    url.push_str(&format!("&type={}", urlencoding::encode(tab_type)));
                }
                url
            })
            .collect()
    }

    async fn try_endpoint(&self, url: &str) -> Result<Vec<SearchResult>, SearchError> {
        let response = self.signer.sign(self.client.get(url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
                body: body_excerpt(&body),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::Parse(format!("{}: {}", url, e)))?;

        Ok(parse_api_results(&body))
    }
}

#[async_trait]
impl SearchStrategy for ApiSearch {
    fn name(&self) -> &str {
        "api"
    }

    async fn attempt(&self, ctx: &SearchContext<'_>) -> Result<Vec<SearchResult>, SearchError> {
        let urls = self.endpoint_urls(ctx.query());
        let total = urls.len();
        let mut last_error = None;

        for (i, url) in urls.iter().enumerate() {
            debug!(endpoint = i + 1, total = total, url = %url, "Probing search endpoint");

            match self.try_endpoint(url).await {
                Ok(results) if !results.is_empty() => return Ok(results),
                Ok(_) => debug!(url = %url, "Endpoint returned no results"),
                Err(e) => {
                    debug!(url = %url, error = %e, "Endpoint failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}

/// Extract results from either known response shape.
///
/// Tries a top-level `tabs` array, then `data.results`. Anything else yields
/// no results. Entries without an id are skipped.
pub fn parse_api_results(body: &Value) -> Vec<SearchResult> {
    let from_tabs = body
        .get("tabs")
        .and_then(Value::as_array)
        .map(|tabs| collect_results(tabs))
        .unwrap_or_default();

    if !from_tabs.is_empty() {
        return from_tabs;
    }

    body.pointer("/data/results")
        .and_then(Value::as_array)
        .map(|tabs| collect_results(tabs))
        .unwrap_or_default()
}

fn collect_results(entries: &[Value]) -> Vec<SearchResult> {
    entries.iter().filter_map(result_from_value).collect()
}

fn result_from_value(entry: &Value) -> Option<SearchResult> {
    let id = id_from_value(entry.get("id")?)?;

    let text = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Some(SearchResult {
        id,
        title: text("song_name"),
        artist: text("artist_name"),
        tab_type: text("type"),
        rating: entry.get("rating").and_then(Value::as_f64).unwrap_or_default(),
        votes: entry
            .get("votes")
            .and_then(Value::as_f64)
            .map(|v| v.max(0.0) as u32)
            .unwrap_or_default(),
        difficulty: entry
            .get("difficulty")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(String::from),
        url: text("tab_url"),
    })
}

/// Ids arrive as numbers or strings depending on the endpoint.
fn id_from_value(value: &Value) -> Option<String> {
    let id = match value {
        Value::Number(n) => match n.as_u64() {
            Some(id) => id.to_string(),
            None => format!("{:.0}", n.as_f64()?),
        },
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}
