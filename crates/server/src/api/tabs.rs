//! Tab fetch and chord-sheet conversion handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tabsync_core::{ConversionResult, RawTab};
use tracing::{info, warn};

use super::handlers::{bad_request, ApiError, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// Tab id as sent by clients, either `123` or `"123"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TabId {
    Number(u64),
    Text(String),
}

impl TabId {
    fn into_string(self) -> String {
        match self {
            TabId::Number(n) => n.to_string(),
            TabId::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OnSongRequest {
    pub id: TabId,
}

#[derive(Debug, Deserialize)]
pub struct FormatRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FormatResponse {
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct TabResponse {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub key: String,
    pub capo: u32,
    pub tuning: String,
    pub difficulty: String,
    pub rating: f64,
    pub votes: u32,
    pub content: String,
    pub onsong_format: String,
    pub chords: Vec<String>,
    pub chord_count: usize,
    pub url: String,
}

impl TabResponse {
    fn new(tab: RawTab, conversion: ConversionResult) -> Self {
        Self {
            id: tab.tab_id.to_string(),
            title: tab.song_name,
            artist: tab.artist_name,
            key: conversion.detected_key,
            capo: tab.capo,
            tuning: tab.tuning,
            difficulty: tab.difficulty,
            rating: tab.rating,
            votes: tab.votes,
            content: tab.content,
            onsong_format: conversion.onsong_format,
            chords: conversion.chords,
            chord_count: conversion.chord_count,
            url: tab.url_web,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tab/{id}
pub async fn get_tab(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TabResponse>, ApiError> {
    let (tab, conversion) = fetch_and_convert(&state, &id).await?;
    info!(tab_id = %id, chords = conversion.chord_count, "Converted tab");
    Ok(Json(TabResponse::new(tab, conversion)))
}

/// POST /api/onsong
///
/// Returns the converted document as plain text.
pub async fn onsong(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OnSongRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = body.id.into_string();
    let (_, conversion) = fetch_and_convert(&state, &id).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        conversion.onsong_format,
    ))
}

/// POST /api/format
///
/// Formats user-supplied content without touching the catalog.
pub async fn format(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FormatRequest>,
) -> Result<Json<FormatResponse>, ApiError> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(bad_request("Title is required"));
    }

    let artist = body.artist.as_deref().unwrap_or_default();
    let formatted = state
        .converter()
        .format_manual_content(title, artist, &body.content);

    Ok(Json(FormatResponse { formatted }))
}

async fn fetch_and_convert(
    state: &AppState,
    id: &str,
) -> Result<(RawTab, ConversionResult), ApiError> {
    if id.trim().is_empty() {
        return Err(bad_request("Tab id is required"));
    }

    let tab = state.catalog().fetch_by_id(id).await.map_err(|e| {
        warn!(tab_id = %id, error = %e, "Failed to fetch tab");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::with_details("Failed to fetch tab", e.to_string())),
        )
    })?;

    let conversion = state.converter().convert(&tab).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Invalid tab", e.to_string())),
        )
    })?;

    Ok((tab, conversion))
}
