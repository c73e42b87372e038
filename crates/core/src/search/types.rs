//! Types for the tab search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::context::SearchContext;

/// Query parameters for a tab search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search query.
    pub query: String,
    /// Optional: limit to a content type ("chords", "tabs", ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub tab_type: Option<String>,
    /// Optional: limit to a difficulty ("novice", "intermediate", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, tab_type: impl Into<String>) -> Self {
        self.tab_type = Some(tab_type.into());
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }

    /// Type filter, ignoring blank values.
    pub fn type_filter(&self) -> Option<&str> {
        self.tab_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Difficulty filter, ignoring blank values.
    pub fn difficulty_filter(&self) -> Option<&str> {
        self.difficulty
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// A candidate tab found by a search.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Catalog-assigned identifier.
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Content type as reported upstream ("Chords", "Tab", ...).
    #[serde(rename = "type")]
    pub tab_type: String,
    /// Average rating, 0.0-5.0.
    pub rating: f64,
    pub votes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    pub url: String,
}

impl SearchResult {
    /// Whether this is a chords-type result (case-insensitive).
    pub fn is_chords(&self) -> bool {
        self.tab_type.trim().eq_ignore_ascii_case("chords")
    }
}

/// Errors that can occur during search operations.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search query cannot be empty")]
    EmptyQuery,

    /// Timeout or connection failure.
    #[error("Search request failed: {0}")]
    Transport(String),

    /// Non-success status from an upstream endpoint.
    #[error("Upstream returned {status} for {url}: {body}")]
    Upstream { url: String, status: u16, body: String },

    /// Malformed upstream payload.
    #[error("Failed to parse search response: {0}")]
    Parse(String),

    #[error("Bypass proxy failed: {0}")]
    Proxy(String),

    /// Every strategy came back empty.
    #[error("No results found")]
    NoResults,
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        SearchError::Transport(e.to_string())
    }
}

/// One tier of the search fallback chain.
///
/// Strategies are tried in order; the first one that returns a non-empty
/// list wins. An `Err` or an empty list both mean "try the next tier".
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Attempt the search.
    async fn attempt(&self, ctx: &SearchContext<'_>) -> Result<Vec<SearchResult>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_minimal() {
        let json = r#"{"query": "wonderwall"}"#;
        let parsed: SearchQuery = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.query, "wonderwall");
        assert!(parsed.tab_type.is_none());
        assert!(parsed.difficulty.is_none());
    }

    #[test]
    fn test_search_query_filters_ignore_blank() {
        let query = SearchQuery::new("x").with_type("  ").with_difficulty("novice");
        assert_eq!(query.type_filter(), None);
        assert_eq!(query.difficulty_filter(), Some("novice"));
    }

    #[test]
    fn test_search_result_uses_type_key() {
        let result = SearchResult {
            id: "1".to_string(),
            tab_type: "Chords".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "Chords");
        assert!(json.get("difficulty").is_none());
        assert!(result.is_chords());
    }
}
