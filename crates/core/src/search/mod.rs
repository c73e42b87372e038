//! Tab search with graceful degradation.
//!
//! The catalog's search API is undocumented and frequently blocked, so
//! [`SearchEngine`] walks a chain of [`SearchStrategy`] tiers from the
//! cheapest to the most brittle and ranks whatever the first productive
//! tier returns.

mod anchors;
mod api;
mod context;
mod embedded;
mod engine;
mod page;
mod ranking;
mod types;

pub use anchors::{harvest_tab_links, AnchorSearch};
pub use api::{parse_api_results, ApiSearch};
pub use context::SearchContext;
pub use embedded::{parse_embedded_store, EmbeddedJsonSearch};
pub use engine::SearchEngine;
pub use page::PageFetcher;
pub use ranking::{dedup_by_id, filter_by_difficulty, filter_top_results, prefers};
pub use types::*;
