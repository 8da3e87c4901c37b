//! Retry policy with exponential backoff for broker API calls.
//!
//! Transient failures (HTTP 5xx, network timeouts, connection errors) are
//! retried on a `min(2^attempt, cap)` schedule with multiplicative jitter.
//! HTTP 4xx responses are never retried; HTTP 429 sleeps for the server's
//! `Retry-After` hint when one is present, falling back to the schedule.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy for broker API calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt (default: 3).
    pub max_retries: u32,
    /// Base delay for the first retry (default: 1s).
    pub base_delay: Duration,
    /// Cap applied to the exponential schedule (default: 32s).
    pub max_delay: Duration,
    /// Jitter factor `j`; each delay is multiplied by `1 + U(-j, j)`
    /// (default: 0.1).
    pub jitter: f64,
    /// Floor for the jittered delay so it can never reach zero
    /// (default: 100ms).
    pub min_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(32),
            jitter: 0.1,
            min_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom retry count, keeping default timing.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// Per-request backoff state.
///
/// Tracks the attempt counter for one logical request and produces the
/// next sleep duration, or `None` once retries are exhausted.
#[derive(Debug)]
pub struct BackoffSchedule {
    attempt: u32,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: f64,
    min_delay: Duration,
}

impl BackoffSchedule {
    /// Start a fresh schedule from a policy.
    #[must_use]
    pub const fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            max_retries: policy.max_retries,
            base_delay: policy.base_delay,
            max_delay: policy.max_delay,
            jitter: policy.jitter,
            min_delay: policy.min_delay,
        }
    }

    /// Get the next backoff duration with jitter applied.
    ///
    /// Returns `None` when retries are exhausted.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_retries {
            return None;
        }

        let base = self.base_for_attempt(self.attempt);
        self.attempt += 1;

        Some(self.apply_jitter(base))
    }

    /// Record a retry whose delay came from elsewhere (e.g. `Retry-After`).
    ///
    /// Returns `false` when retries are already exhausted.
    pub fn consume_attempt(&mut self) -> bool {
        if self.attempt >= self.max_retries {
            return false;
        }
        self.attempt += 1;
        true
    }

    /// Number of attempts made so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Base delay for a given attempt index, before jitter: `min(base * 2^n, cap)`.
    fn base_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.as_secs_f64() * 2f64.powi(attempt.min(30) as i32);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }

    /// Multiply by `1 + U(-j, j)`, then floor at the configured minimum.
    fn apply_jitter(&self, base: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return base.max(self.min_delay);
        }
        let mut rng = rand::rng();
        let factor = 1.0 + rng.random_range(-self.jitter..=self.jitter);
        let jittered = Duration::from_secs_f64((base.as_secs_f64() * factor).max(0.0));
        jittered.max(self.min_delay)
    }
}

/// Parse a `Retry-After` header value in seconds form.
///
/// HTTP-date form is not supported; the brokerage only sends seconds.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
