//! Search API handler.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tabsync_core::{SearchQuery, SearchResult};
use tracing::warn;

use super::handlers::{bad_request, ApiError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub title: Option<String>,
    /// Alias for `title`.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub tab_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl SearchParams {
    fn query_text(&self) -> Option<&str> {
        [self.title.as_deref(), self.q.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// GET /api/search
///
/// Upstream blocking is routine, so an engine failure yields an empty list
/// rather than an error.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    let Some(text) = params.query_text() else {
        return Err(bad_request("Query parameter 'title' or 'q' is required"));
    };

    let mut query = SearchQuery::new(text);
    if let Some(tab_type) = &params.tab_type {
        query = query.with_type(tab_type.as_str());
    }
    if let Some(difficulty) = &params.difficulty {
        query = query.with_difficulty(difficulty.as_str());
    }

    match state.search().search(&query).await {
        Ok(results) => Ok(Json(results)),
        Err(e) => {
            warn!(query = %text, error = %e, "Search failed, returning no results");
            Ok(Json(Vec::new()))
        }
    }
}
