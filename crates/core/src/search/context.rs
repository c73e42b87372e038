//! Per-search state shared by the strategies.

use tokio::sync::OnceCell;

use super::page::PageFetcher;
use super::{SearchError, SearchQuery};

/// State for a single `search` call.
///
/// The search page is fetched at most once, the first time a markup-based
/// strategy asks for it; later strategies reuse the same markup (or error).
pub struct SearchContext<'a> {
    query: &'a SearchQuery,
    fetcher: Option<&'a PageFetcher>,
    markup: OnceCell<Result<String, SearchError>>,
}

impl<'a> SearchContext<'a> {
    pub fn new(query: &'a SearchQuery, fetcher: &'a PageFetcher) -> Self {
        Self {
            query,
            fetcher: Some(fetcher),
            markup: OnceCell::new(),
        }
    }

    /// Context with pre-fetched markup.
    pub fn with_markup(query: &'a SearchQuery, markup: impl Into<String>) -> Self {
        Self {
            query,
            fetcher: None,
            markup: OnceCell::new_with(Some(Ok(markup.into()))),
        }
    }

    pub fn query(&self) -> &SearchQuery {
        self.query
    }

    /// Search page markup, fetched on first use.
    pub async fn markup(&self) -> Result<&str, SearchError> {
        let cached = self
            .markup
            .get_or_init(|| async {
                match self.fetcher {
                    Some(fetcher) => fetcher.fetch(self.query).await,
                    None => Err(SearchError::Transport(
                        "no search page source configured".to_string(),
                    )),
                }
            })
            .await;

        match cached {
            Ok(markup) => Ok(markup.as_str()),
            Err(e) => Err(e.clone()),
        }
    }
}
