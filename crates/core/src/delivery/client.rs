//! Webhook sender with bounded retry.

use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::body_excerpt;
use crate::config::DeliveryConfig;

use super::backoff::BackoffPolicy;
use super::{DeliveryError, DeliveryResult, WebhookPayload};

const TEST_SOURCE: &str = "TabSync Test";

/// Outcome of a single POST.
enum AttemptError {
    /// The request could not even be built; retrying cannot help.
    Permanent(String),
    Retryable(String),
}

/// Delivers chord sheets to the configured webhook consumer.
pub struct WebhookClient {
    client: Client,
    policy: BackoffPolicy,
    attempt_timeout: Duration,
    user_agent: String,
}

impl WebhookClient {
    /// Create a client using the configured retry schedule.
    pub fn new(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        Self::with_policy(config, BackoffPolicy::from(config))
    }

    /// Create a client with an explicit retry schedule.
    pub fn with_policy(config: &DeliveryConfig, policy: BackoffPolicy) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DeliveryError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            policy,
            attempt_timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// POST the payload, retrying transient failures under the backoff policy.
    ///
    /// Every attempt carries the same `X-Delivery-ID` and an increasing
    /// `X-Attempt`. On exhaustion the full result comes back inside
    /// [`DeliveryError::Failed`].
    pub async fn send_with_retry(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<DeliveryResult, DeliveryError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DeliveryError::Configuration("webhook URL is empty".to_string()));
        }

        let body = serde_json::to_vec(payload)
            .map_err(|e| DeliveryError::Serialization(e.to_string()))?;

        let start = Instant::now();
        let delivery_id = new_delivery_id();
        let mut attempts: u32 = 0;

        let last_error = loop {
            attempts += 1;

            // No attempt may outlive the overall budget
            let remaining = self.policy.max_elapsed.saturating_sub(start.elapsed());
            let timeout = self.attempt_timeout.min(remaining);

            let outcome = self
                .attempt(url, &body, &delivery_id, attempts, timeout)
                .await;
            let error = match outcome {
                Ok(()) => {
                    let result =
                        DeliveryResult::finished(delivery_id, attempts, start.elapsed(), None);
                    info!(
                        delivery_id = %result.delivery_id,
                        attempts = attempts,
                        duration = %result.duration,
                        "Webhook delivered"
                    );
                    return Ok(result);
                }
                Err(AttemptError::Permanent(e)) => {
                    warn!(
                        delivery_id = %delivery_id,
                        attempt = attempts,
                        error = %e,
                        "Webhook request could not be built, not retrying"
                    );
                    break e;
                }
                Err(AttemptError::Retryable(e)) => e,
            };

            let retries_done = attempts - 1;
            let delay = self.policy.next_delay(retries_done, rand::random::<f64>());
            if !self.policy.allows_retry(retries_done, start.elapsed(), delay) {
                warn!(
                    delivery_id = %delivery_id,
                    attempt = attempts,
                    error = %error,
                    "Webhook attempt failed, retries exhausted"
                );
                break error;
            }

            warn!(
                delivery_id = %delivery_id,
                attempt = attempts,
                error = %error,
                retry_in_ms = delay.as_millis() as u64,
                "Webhook attempt failed, will retry"
            );
            tokio::time::sleep(delay).await;
        };

        let result = DeliveryResult::finished(delivery_id, attempts, start.elapsed(), Some(last_error));
        Err(DeliveryError::Failed(Box::new(result)))
    }

    /// POST the payload once, without retry or delivery headers.
    pub async fn send(&self, url: &str, payload: &WebhookPayload) -> Result<(), DeliveryError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DeliveryError::Configuration("webhook URL is empty".to_string()));
        }

        let response = self
            .client
            .post(url)
            .header("User-Agent", &self.user_agent)
            .timeout(self.attempt_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Request(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Request(format!(
                "webhook returned status {}: {}",
                status.as_u16(),
                body_excerpt(&body)
            )));
        }

        debug!(url = %url, "Single webhook delivery succeeded");
        Ok(())
    }

    /// Send a fixed diagnostic payload once to check reachability.
    pub async fn test_webhook(&self, url: &str) -> Result<(), DeliveryError> {
        self.send(url, &test_payload()).await
    }

    async fn attempt(
        &self,
        url: &str,
        body: &[u8],
        delivery_id: &str,
        attempt: u32,
        timeout: Duration,
    ) -> Result<(), AttemptError> {
        let request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", &self.user_agent)
            .header("X-Delivery-ID", delivery_id)
            .header("X-Attempt", attempt.to_string())
            .timeout(timeout)
            .body(body.to_vec())
            .build()
            .map_err(|e| AttemptError::Permanent(format!("creating request: {}", e)))?;

        debug!(delivery_id = delivery_id, attempt = attempt, "Sending webhook");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| AttemptError::Retryable(format!("attempt {} failed: {}", attempt, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AttemptError::Retryable(format!(
            "attempt {}: webhook returned status {}: {}",
            attempt,
            status.as_u16(),
            body_excerpt(&body)
        )))
    }
}

/// Diagnostic payload used by [`WebhookClient::test_webhook`].
pub fn test_payload() -> WebhookPayload {
    WebhookPayload::new(
        "Test Song",
        "Test Artist",
        "C",
        0,
        "{title: Test Song}\n{artist: Test Artist}\n{key: C}\n\nThis is a test webhook payload.",
        TEST_SOURCE,
    )
}

fn new_delivery_id() -> String {
    format!("delivery_{}", Uuid::new_v4().simple())
}
