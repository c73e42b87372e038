//! Catalog API client for single-tab lookups.

use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CatalogConfig;

use super::signer::RequestSigner;
use super::types::{Contributor, RawTab};
use super::{body_excerpt, CatalogError};

/// Layout of the catalog's `date` field.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Authenticated catalog API client.
pub struct CatalogClient {
    client: Client,
    base_url: String,
    signer: Arc<RequestSigner>,
}

impl CatalogClient {
    /// Create a new catalog client sharing the given signer.
    pub fn new(config: &CatalogConfig, signer: Arc<RequestSigner>) -> Result<Self, CatalogError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// Fetch a tab by its catalog id.
    pub async fn fetch_by_id(&self, tab_id: &str) -> Result<RawTab, CatalogError> {
        let tab_id = tab_id.trim();
        if tab_id.is_empty() {
            return Err(CatalogError::InvalidId(tab_id.to_string()));
        }

        let url = format!(
            "{}/tab/info?tab_id={}&tab_access_type=private",
            self.base_url,
            urlencoding::encode(tab_id)
        );

        debug!(tab_id = tab_id, "Fetching tab from catalog");

        let response = self.signer.sign(self.client.get(&url)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(tab_id = tab_id, status = status.as_u16(), "Catalog rejected tab request");
            return Err(CatalogError::Api {
                status: status.as_u16(),
                url,
                body: body_excerpt(&body),
            });
        }

        let tab: UgTabResponse = response.json().await.map_err(|e| {
            CatalogError::Parse(format!("Failed to parse tab response: {}", e))
        })?;

        Ok(tab.into())
    }
}

// ============================================================================
// Catalog API Response Types (private)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UgTabResponse {
    id: u64,
    song_name: Option<String>,
    artist_name: Option<String>,
    #[serde(rename = "type")]
    tab_type: Option<String>,
    part: Option<String>,
    version: Option<u32>,
    votes: Option<u32>,
    rating: Option<f64>,
    date: Option<String>,
    status: Option<String>,
    tonality_name: Option<String>,
    verified: Option<u8>,
    capo: Option<u32>,
    tuning: Option<String>,
    difficulty: Option<String>,
    content: Option<String>,
    #[serde(rename = "urlWeb")]
    url_web: Option<String>,
    contributor: Option<UgContributor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UgContributor {
    user_id: u64,
    username: Option<String>,
}

impl From<UgTabResponse> for RawTab {
    fn from(ug: UgTabResponse) -> Self {
        let contributor = ug
            .contributor
            .map(|c| Contributor {
                user_id: c.user_id,
                username: c.username.unwrap_or_default(),
            })
            .unwrap_or_default();

        RawTab {
            tab_id: ug.id,
            song_name: ug.song_name.unwrap_or_default(),
            artist_name: ug.artist_name.unwrap_or_default(),
            tab_type: ug.tab_type.unwrap_or_default(),
            part: ug.part.unwrap_or_default(),
            version: ug.version.unwrap_or_default(),
            votes: ug.votes.unwrap_or_default(),
            rating: ug.rating.unwrap_or_default(),
            date: ug.date.as_deref().and_then(parse_tab_date),
            status: ug.status.unwrap_or_default(),
            tonality_name: ug.tonality_name,
            verified: ug.verified.unwrap_or_default() != 0,
            capo: ug.capo.unwrap_or_default(),
            tuning: ug.tuning.unwrap_or_default(),
            difficulty: ug.difficulty.unwrap_or_default(),
            content: ug.content.unwrap_or_default(),
            url_web: ug.url_web.unwrap_or_default(),
            contributor,
        }
    }
}

/// Parse the catalog date; failure leaves the date unset.
fn parse_tab_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}
