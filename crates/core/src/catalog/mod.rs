//! Catalog API integration.
//!
//! The catalog exposes an undocumented mobile API. Every request must carry
//! the mobile client's header fingerprint plus a device id and an hour-windowed
//! signature, see [`RequestSigner`].

mod client;
mod signer;
mod types;

pub use client::CatalogClient;
pub use signer::{generate_device_id, RequestSigner};
pub use types::*;

use thiserror::Error;

/// Maximum number of characters of an upstream body kept for diagnostics.
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when fetching from the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport failure (connection, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog answered with a non-success status.
    #[error("API error: {status} from {url}: {body}")]
    Api {
        status: u16,
        url: String,
        body: String,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid tab id: '{0}'")]
    InvalidId(String),
}

/// Truncate an upstream body to a bounded excerpt for error messages.
pub(crate) fn body_excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}
