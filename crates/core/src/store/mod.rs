//! Storage for the webhook destination.

mod webhook;

pub use webhook::{WebhookConfig, WebhookStore};

use thiserror::Error;

/// Errors that can occur when storing the destination.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid webhook config: {0}")]
    Invalid(String),

    #[error("Failed to serialize webhook config: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
