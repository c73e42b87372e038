//! Fetching the public search page, optionally through a bypass proxy.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::body_excerpt;
use crate::config::SearchConfig;

use super::{SearchError, SearchQuery};

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches search page markup.
///
/// With a bypass proxy configured the page is rendered through it first; any
/// proxy failure falls through to a direct request.
pub struct PageFetcher {
    client: Client,
    search_page_url: String,
    proxy_url: Option<String>,
    proxy_max_timeout_ms: u64,
    user_agent: String,
}

impl PageFetcher {
    pub fn new(config: &SearchConfig, user_agent: impl Into<String>) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SearchError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let proxy_url = config
            .bypass_proxy_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .map(String::from);

        Ok(Self {
            client,
            search_page_url: config.search_page_url.clone(),
            proxy_url,
            proxy_max_timeout_ms: config.proxy_max_timeout_ms,
            user_agent: user_agent.into(),
        })
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy_url.is_some()
    }

    /// Build the plain search page URL for a query.
    pub fn build_url(&self, query: &SearchQuery) -> String {
        let mut url = format!(
            "{}?search_type=title&value={}",
            self.search_page_url,
            urlencoding::encode(query.query.trim())
        );
        if let Some(tab_type) = query.type_filter() {
            url.push_str(&format!("&type={}", urlencoding::encode(tab_type)));
        }
        url
    }

    /// Fetch the search page markup for a query.
    pub async fn fetch(&self, query: &SearchQuery) -> Result<String, SearchError> {
        let url = self.build_url(query);

        if let Some(proxy) = &self.proxy_url {
            match self.fetch_via_proxy(proxy, &url).await {
                Ok(markup) => {
                    debug!(url = %url, "Bypass proxy rendered search page");
                    return Ok(markup);
                }
                Err(e) => {
                    warn!(error = %e, "Bypass proxy failed, falling back to direct request");
                }
            }
        }

        self.fetch_direct(&url).await
    }

    async fn fetch_direct(&self, url: &str) -> Result<String, SearchError> {
        debug!(url = %url, "Fetching search page directly");

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", BROWSER_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SearchError::Upstream {
                url: url.to_string(),
                status: status.as_u16(),
                body: body_excerpt(&body),
            });
        }

        Ok(body)
    }

    async fn fetch_via_proxy(&self, proxy: &str, target: &str) -> Result<String, SearchError> {
        let request = ProxyRequest {
            cmd: "request.get",
            url: target,
            max_timeout: self.proxy_max_timeout_ms,
            post_body: "",
            cookies: Vec::new(),
        };

        let response = self
            .client
            .post(format!("{}/v1", proxy))
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Proxy(e.to_string()))?;

        let result: ProxyResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Proxy(format!("Failed to decode proxy response: {}", e)))?;

        if result.status != "ok" {
            return Err(SearchError::Proxy(format!(
                "status: {}, message: {}",
                result.status, result.message
            )));
        }

        Ok(result.solution.response)
    }
}

// ============================================================================
// Bypass proxy wire format (private)
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProxyRequest<'a> {
    cmd: &'static str,
    url: &'a str,
    max_timeout: u64,
    post_body: &'static str,
    cookies: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxyResponse {
    status: String,
    message: String,
    solution: ProxySolution,
}

/// Rendered page; the proxy also reports the final url and status.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProxySolution {
    response: String,
}
