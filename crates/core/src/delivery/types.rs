//! Types for webhook delivery.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body POSTed to the webhook consumer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub title: String,
    pub artist: String,
    pub key: String,
    /// Omitted from the body when zero.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub capo: u32,
    pub onsong_format: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl WebhookPayload {
    /// Create a payload stamped with the current time.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        key: impl Into<String>,
        capo: u32,
        onsong_format: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            key: key.into(),
            capo,
            onsong_format: onsong_format.into(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Outcome of one `send_with_retry` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub success: bool,
    /// Identifier sent as `X-Delivery-ID` on every attempt.
    pub delivery_id: String,
    /// Attempts made, at least 1.
    pub attempts: u32,
    /// Last failure, when unsuccessful.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Elapsed wall-clock time, human readable (e.g. "1.503s").
    pub duration: String,
    /// When the delivery finished.
    pub timestamp: DateTime<Utc>,
}

impl DeliveryResult {
    pub(crate) fn finished(
        delivery_id: String,
        attempts: u32,
        elapsed: Duration,
        error: Option<String>,
    ) -> Self {
        Self {
            success: error.is_none(),
            delivery_id,
            attempts,
            error,
            duration: format!("{:?}", elapsed),
            timestamp: Utc::now(),
        }
    }
}
