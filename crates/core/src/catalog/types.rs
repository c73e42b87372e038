//! Types for catalog tab records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tuning that is not worth mentioning in a chord sheet.
pub const STANDARD_TUNING: &str = "E A D G B E";

/// A tab record normalized from the catalog API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawTab {
    /// Catalog tab id.
    pub tab_id: u64,
    pub song_name: String,
    pub artist_name: String,
    /// Content type ("Chords", "Tab", ...).
    pub tab_type: String,
    pub part: String,
    pub version: u32,
    pub votes: u32,
    /// Average rating, 0.0-5.0.
    pub rating: f64,
    /// Publication date. `None` when absent or unparseable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub status: String,
    /// Declared key; the catalog sends "" or "undefined" when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tonality_name: Option<String>,
    pub verified: bool,
    pub capo: u32,
    pub tuning: String,
    pub difficulty: String,
    /// Raw tab markup (`[ch]`, `[tab]` annotations).
    pub content: String,
    /// Canonical web page of the tab.
    pub url_web: String,
    pub contributor: Contributor,
}

impl RawTab {
    /// Declared key, ignoring the catalog's placeholders.
    pub fn declared_key(&self) -> Option<&str> {
        self.tonality_name
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != "undefined")
    }

    /// Whether the tuning differs from standard and should be printed.
    pub fn has_custom_tuning(&self) -> bool {
        let tuning = self.tuning.trim();
        !tuning.is_empty() && tuning != STANDARD_TUNING
    }
}

/// Who uploaded a tab.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contributor {
    pub user_id: u64,
    pub username: String,
}
