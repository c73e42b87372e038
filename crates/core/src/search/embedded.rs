//! Extraction of the JSON store embedded in the search page.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;

use super::{SearchContext, SearchError, SearchResult, SearchStrategy};

static STORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<div class="js-store"[^>]*data-content="([^"]+)""#).expect("valid regex")
});

/// Reads the entity-encoded `js-store` attribute of the search page.
pub struct EmbeddedJsonSearch;

#[async_trait]
impl SearchStrategy for EmbeddedJsonSearch {
    fn name(&self) -> &str {
        "embedded_json"
    }

    async fn attempt(&self, ctx: &SearchContext<'_>) -> Result<Vec<SearchResult>, SearchError> {
        let markup = ctx.markup().await?;
        parse_embedded_store(markup)
    }
}

/// Parse search results out of the embedded store.
///
/// A page without the store container has no results; a container holding
/// malformed JSON is a parse error.
pub fn parse_embedded_store(markup: &str) -> Result<Vec<SearchResult>, SearchError> {
    let Some(captures) = STORE_RE.captures(markup) else {
        return Ok(Vec::new());
    };

    let json = decode_entities(&captures[1]);
    let store: StoreDocument = serde_json::from_str(&json)
        .map_err(|e| SearchError::Parse(format!("embedded store: {}", e)))?;

    Ok(store
        .store
        .page
        .data
        .results
        .into_iter()
        .map(SearchResult::from)
        .collect())
}

/// Decode the entities the page uses inside attribute values.
///
/// `&amp;` goes last so that `&amp;quot;` stays a literal `&quot;`.
fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

// ============================================================================
// Embedded store schema (private)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreDocument {
    store: Store,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Store {
    page: StorePage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorePage {
    data: StoreData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreData {
    results: Vec<StoreResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoreResult {
    id: u64,
    song_name: String,
    artist_name: String,
    #[serde(rename = "type")]
    tab_type: String,
    tab_url: String,
    rating: f64,
    votes: u32,
    difficulty: Option<String>,
}

impl From<StoreResult> for SearchResult {
    fn from(r: StoreResult) -> Self {
        SearchResult {
            id: r.id.to_string(),
            title: r.song_name,
            artist: r.artist_name,
            tab_type: r.tab_type,
            rating: r.rating,
            votes: r.votes,
            difficulty: r.difficulty.filter(|d| !d.is_empty()),
            url: r.tab_url,
        }
    }
}
