//! Webhook destination and delivery handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tabsync_core::{DeliveryError, DeliveryResult, StoreError, WebhookConfig, WebhookPayload};
use tracing::{info, warn};

use super::handlers::{bad_request, ApiError, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SaveConfigRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct WebhookConfigResponse {
    #[serde(flatten)]
    pub config: WebhookConfig,
    pub configured: bool,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub content: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub capo: u32,
}

/// Body returned when retries are exhausted.
#[derive(Debug, Serialize)]
pub struct DeliveryFailure {
    pub success: bool,
    pub error: String,
    pub details: String,
    pub result: DeliveryResult,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/webhook/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<WebhookConfigResponse> {
    let store = state.webhook_store();
    Json(WebhookConfigResponse {
        config: store.get().await,
        configured: store.is_configured().await,
    })
}

/// POST /api/webhook/config
pub async fn save_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveConfigRequest>,
) -> Result<Json<WebhookConfigResponse>, ApiError> {
    let store = state.webhook_store();
    let saved = store
        .save(WebhookConfig::new(body.url, body.enabled))
        .await
        .map_err(|e| match e {
            StoreError::Invalid(msg) => bad_request(msg),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_details(
                    "Failed to save webhook config",
                    other.to_string(),
                )),
            ),
        })?;

    Ok(Json(WebhookConfigResponse {
        configured: saved.enabled,
        config: saved,
    }))
}

/// DELETE /api/webhook/config
pub async fn clear_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.webhook_store().clear().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_details(
                "Failed to clear webhook config",
                e.to_string(),
            )),
        )
    })?;

    Ok(Json(SuccessResponse {
        success: true,
        message: "Webhook configuration cleared".to_string(),
    }))
}

/// POST /api/webhook/test
///
/// Sends the diagnostic payload once to the configured destination.
pub async fn test(State(state): State<Arc<AppState>>) -> Result<Json<SuccessResponse>, ApiError> {
    let url = configured_url(&state).await?;

    state.delivery().test_webhook(&url).await.map_err(|e| {
        warn!(error = %e, "Webhook test failed");
        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::with_details("Webhook test failed", e.to_string())),
        )
    })?;

    info!("Webhook test succeeded");
    Ok(Json(SuccessResponse {
        success: true,
        message: "Test webhook delivered".to_string(),
    }))
}

/// POST /api/webhook/send
///
/// Delivers a chord sheet with retry. Exhaustion answers 502 with the
/// delivery record attached.
pub async fn send(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SendRequest>,
) -> Result<Json<DeliveryResult>, (StatusCode, Json<serde_json::Value>)> {
    if body.title.trim().is_empty() || body.content.trim().is_empty() {
        return Err(json_error(bad_request("Title and content are required")));
    }

    let url = configured_url(&state).await.map_err(json_error)?;

    let payload = WebhookPayload::new(
        body.title,
        body.artist,
        body.key,
        body.capo,
        body.content,
        state.config().delivery.source_label.clone(),
    );

    match state.delivery().send_with_retry(&url, &payload).await {
        Ok(result) => Ok(Json(result)),
        Err(DeliveryError::Failed(result)) => {
            let failure = DeliveryFailure {
                success: false,
                error: "Webhook delivery failed".to_string(),
                details: result.error.clone().unwrap_or_default(),
                result: *result,
            };
            Err((StatusCode::BAD_GATEWAY, Json(to_value(&failure))))
        }
        Err(e) => Err(json_error((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details("Webhook delivery failed", e.to_string())),
        ))),
    }
}

async fn configured_url(state: &AppState) -> Result<String, ApiError> {
    state
        .webhook_store()
        .url()
        .await
        .ok_or_else(|| bad_request("Webhook not configured"))
}

fn json_error((status, Json(body)): ApiError) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(to_value(&body)))
}

fn to_value<T: Serialize>(body: &T) -> serde_json::Value {
    serde_json::to_value(body).unwrap_or_default()
}
