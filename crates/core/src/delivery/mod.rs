//! Webhook delivery with at-least-once, bounded-retry semantics.

mod backoff;
mod client;
mod types;

pub use backoff::{jittered, BackoffPolicy};
pub use client::{test_payload, WebhookClient};
pub use types::*;

use thiserror::Error;

/// Errors that can occur when delivering a webhook.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Missing or unusable destination.
    #[error("Webhook configuration error: {0}")]
    Configuration(String),

    #[error("Failed to serialize payload: {0}")]
    Serialization(String),

    /// A single-attempt send failed.
    #[error("Webhook request failed: {0}")]
    Request(String),

    /// Retries exhausted; carries the full delivery record.
    #[error(
        "Webhook delivery failed after {} attempts: {}",
        .0.attempts,
        .0.error.as_deref().unwrap_or("unknown error")
    )]
    Failed(Box<DeliveryResult>),
}

impl DeliveryError {
    /// The delivery record, when retries were attempted.
    pub fn result(&self) -> Option<&DeliveryResult> {
        match self {
            DeliveryError::Failed(result) => Some(result),
            _ => None,
        }
    }
}
