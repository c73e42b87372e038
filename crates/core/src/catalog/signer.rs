//! Request signing for the catalog API.
//!
//! The API authenticates the mobile client by a device id plus an hour-bucketed
//! hash: `md5(device_id + "YYYY-MM-DD:H" + "createLog()")`, with the date in UTC
//! and the hour without a leading zero.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Timelike, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use reqwest::RequestBuilder;
use tracing::warn;

/// Literal appended to every signature payload.
const SIGNATURE_SUFFIX: &str = "createLog()";

/// Length of the device id in hex characters.
const DEVICE_ID_LEN: usize = 16;

/// Signs catalog requests with a per-process device id.
///
/// Construct once at startup and share it (behind an `Arc`) between the
/// catalog client and the search engine, so both present the same device.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    device_id: String,
    user_agent: String,
}

impl RequestSigner {
    /// Create a signer with a freshly generated device id.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self::with_device_id(generate_device_id(), user_agent)
    }

    /// Create a signer with a known device id.
    pub fn with_device_id(device_id: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Signature valid for the current UTC hour.
    pub fn signature(&self) -> String {
        self.signature_at(Utc::now())
    }

    /// Signature valid for the hour containing `now`.
    pub fn signature_at(&self, now: DateTime<Utc>) -> String {
        let window = format!("{}:{}", now.format("%Y-%m-%d"), now.hour());
        let payload = format!("{}{}{}", self.device_id, window, SIGNATURE_SUFFIX);
        format!("{:x}", md5::compute(payload.as_bytes()))
    }

    /// Apply the client fingerprint and a fresh signature to a request.
    ///
    /// `Accept-Encoding` is never set: the HTTP client is built without
    /// compression support, so it does not add one either.
    pub fn sign(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Accept-Charset", "utf-8")
            .header("Accept", "application/json")
            .header("User-Agent", &self.user_agent)
            .header("Connection", "close")
            .header("X-UG-CLIENT-ID", &self.device_id)
            .header("X-UG-API-KEY", self.signature())
    }
}

/// Generate a device id from 16 random bytes, hex-encoded and truncated.
///
/// Falls back to a clock-derived id if the OS random source is unavailable.
pub fn generate_device_id() -> String {
    let mut raw = [0u8; 16];
    match OsRng.try_fill_bytes(&mut raw) {
        Ok(()) => {
            let hex: String = raw.iter().map(|b| format!("{:02x}", b)).collect();
            hex[..DEVICE_ID_LEN].to_string()
        }
        Err(e) => {
            warn!(error = %e, "OS random source unavailable, using clock-derived device id");
            time_derived_device_id()
        }
    }
}

fn time_derived_device_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let hex = format!("{:0width$x}", nanos, width = DEVICE_ID_LEN);
    hex[..DEVICE_ID_LEN].to_string()
}
