//! The search fallback chain.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::catalog::RequestSigner;
use crate::config::{CatalogConfig, SearchConfig};

use super::anchors::AnchorSearch;
use super::api::ApiSearch;
use super::embedded::EmbeddedJsonSearch;
use super::page::PageFetcher;
use super::ranking::{dedup_by_id, filter_by_difficulty, filter_top_results};
use super::{SearchContext, SearchError, SearchQuery, SearchResult, SearchStrategy};

/// Resolves free-text queries into ranked tab candidates.
///
/// Strategies run in order: signed API search, then the embedded store of the
/// search page, then link harvesting on the same page. The first tier with
/// results left after the difficulty filter wins. Tier failures are logged and never surface on their own.
pub struct SearchEngine {
    strategies: Vec<Box<dyn SearchStrategy>>,
    fetcher: PageFetcher,
}

impl SearchEngine {
    /// Build the standard chain sharing the catalog signer.
    pub fn new(
        config: &SearchConfig,
        catalog: &CatalogConfig,
        signer: Arc<RequestSigner>,
    ) -> Result<Self, SearchError> {
        let fetcher = PageFetcher::new(config, signer.user_agent())?;
        let strategies: Vec<Box<dyn SearchStrategy>> = vec![
            Box::new(ApiSearch::new(catalog, signer)?),
            Box::new(EmbeddedJsonSearch),
            Box::new(AnchorSearch),
        ];

        Ok(Self::with_strategies(strategies, fetcher))
    }

    /// Build an engine with a custom strategy chain.
    pub fn with_strategies(strategies: Vec<Box<dyn SearchStrategy>>, fetcher: PageFetcher) -> Self {
        Self {
            strategies,
            fetcher,
        }
    }

    /// Names of the strategies, in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the fallback chain for a query.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        if query.query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        info!(
            query = %query.query,
            tab_type = ?query.type_filter(),
            difficulty = ?query.difficulty_filter(),
            "Searching tabs"
        );

        let ctx = SearchContext::new(query, &self.fetcher);

        for strategy in &self.strategies {
            match strategy.attempt(&ctx).await {
                Ok(results) if !results.is_empty() => {
                    let raw = results.len();
                    let kept = narrow(results, query);
                    if kept.is_empty() {
                        debug!(
                            strategy = strategy.name(),
                            raw = raw,
                            "Search strategy results all filtered out"
                        );
                        continue;
                    }
                    info!(
                        strategy = strategy.name(),
                        count = kept.len(),
                        "Search strategy succeeded"
                    );
                    return Ok(filter_top_results(kept));
                }
                Ok(_) => {
                    debug!(strategy = strategy.name(), "Search strategy found nothing");
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "Search strategy failed");
                }
            }
        }

        Err(SearchError::NoResults)
    }
}

/// Dedup a tier's results and apply the query's difficulty filter.
fn narrow(results: Vec<SearchResult>, query: &SearchQuery) -> Vec<SearchResult> {
    let results = dedup_by_id(results);
    match query.difficulty_filter() {
        Some(difficulty) => filter_by_difficulty(results, difficulty),
        None => results,
    }
}
