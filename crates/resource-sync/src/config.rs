//! Per-resource polling configuration and backoff arithmetic.

use rand::Rng;
use std::time::Duration;

use crate::error::SyncError;

/// Polling cadence for one resource key.
///
/// Defaults are placeholders pending product requirements on acceptable
/// staleness; override them per resource at registration time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    /// Delay between successful fetches.
    pub interval: Duration,
    /// Deadline for a single fetch. Must be shorter than `interval`.
    pub timeout: Duration,
    /// Upper bound on the failure backoff delay.
    pub max_backoff: Duration,
    /// Fraction of the delay randomized in both directions, in `[0, 1)`.
    pub jitter_ratio: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(10),
            max_backoff: Duration::from_secs(300),
            jitter_ratio: 0.1,
        }
    }
}

impl PollConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_jitter_ratio(mut self, jitter_ratio: f64) -> Self {
        self.jitter_ratio = jitter_ratio;
        self
    }

    /// Check the config invariants.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.interval.is_zero() {
            return Err(SyncError::InvalidConfig(
                "interval must be non-zero".to_string(),
            ));
        }
        if self.timeout >= self.interval {
            return Err(SyncError::InvalidConfig(format!(
                "timeout ({:?}) must be shorter than interval ({:?})",
                self.timeout, self.interval
            )));
        }
        if !(0.0..1.0).contains(&self.jitter_ratio) {
            return Err(SyncError::InvalidConfig(format!(
                "jitter_ratio ({}) must be in [0, 1)",
                self.jitter_ratio
            )));
        }
        Ok(())
    }

    /// Backoff delay after `consecutive_failures` failed fetches, before
    /// jitter: `min(max_backoff, interval * 2^failures)`.
    pub fn retry_delay(&self, consecutive_failures: u32) -> Duration {
        let multiplier = 2u32
            .checked_pow(consecutive_failures)
            .unwrap_or(u32::MAX);
        self.interval.saturating_mul(multiplier).min(self.max_backoff)
    }

    /// Delay until the next fetch given the current failure streak, with
    /// jitter applied.
    pub fn next_delay(&self, consecutive_failures: u32) -> Duration {
        let base = if consecutive_failures == 0 {
            self.interval
        } else {
            self.retry_delay(consecutive_failures)
        };
        self.jittered(base)
    }

    /// Randomize `base` by up to `jitter_ratio` in either direction.
    fn jittered(&self, base: Duration) -> Duration {
        if self.jitter_ratio == 0.0 || base.is_zero() {
            return base;
        }
        let spread = base.as_secs_f64() * self.jitter_ratio;
        let offset = rand::rng().random_range(-spread..=spread);
        Duration::from_secs_f64((base.as_secs_f64() + offset).max(0.0))
    }
}
