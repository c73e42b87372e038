//! Exponential backoff with jitter.
//!
//! The delay curve is pure: given a retry number and a random unit value it
//! always yields the same duration, so it can be tested without sleeping.

use std::time::Duration;

use crate::config::DeliveryConfig;

/// Retry schedule for webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_interval: Duration,
    /// Cap on the un-jittered interval.
    pub max_interval: Duration,
    pub multiplier: f64,
    /// Jitter fraction; 0.5 spreads each delay over ±50%.
    pub randomization_factor: f64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Budget for the whole sequence, attempts and sleeps included.
    pub max_elapsed: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&DeliveryConfig::default())
    }
}

impl From<&DeliveryConfig> for BackoffPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            multiplier: config.multiplier,
            randomization_factor: config.randomization_factor,
            max_retries: config.max_retries,
            max_elapsed: Duration::from_secs(config.max_elapsed_secs),
        }
    }
}

impl BackoffPolicy {
    /// Un-jittered interval before retry number `retry` (0-based).
    pub fn base_interval(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let secs = self.initial_interval.as_secs_f64() * factor;
        let max = self.max_interval.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            self.max_interval
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Jittered delay before retry number `retry`.
    ///
    /// `random_unit` must be in `[0, 1)`; it picks a point in the jitter window.
    pub fn next_delay(&self, retry: u32, random_unit: f64) -> Duration {
        jittered(self.base_interval(retry), self.randomization_factor, random_unit)
    }

    /// Whether another retry is allowed after `retries_done` retries.
    pub fn allows_retry(&self, retries_done: u32, elapsed: Duration, next_delay: Duration) -> bool {
        retries_done < self.max_retries && elapsed + next_delay <= self.max_elapsed
    }
}

/// Spread `interval` uniformly over `[interval·(1-factor), interval·(1+factor)]`.
pub fn jittered(interval: Duration, factor: f64, random_unit: f64) -> Duration {
    let factor = factor.clamp(0.0, 1.0);
    let unit = random_unit.clamp(0.0, 1.0);
    let base = interval.as_secs_f64();
    let delta = base * factor;
    let low = base - delta;
    let high = base + delta;
    Duration::from_secs_f64(low + unit * (high - low))
}
