//! Sliding-window rate limiting for the brokerage API.
//!
//! The brokerage allows a fixed number of requests per trailing window
//! (200 per 60s per credential set). The limiter is consulted before every
//! request attempt, including retries; callers sleep the reported wait time
//! when blocked and record the request unconditionally afterwards.
//!
//! State is in-memory only; nothing survives a process restart.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Rate limit window configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests inside one trailing window (default: 200).
    pub capacity: usize,
    /// Trailing window length (default: 60s).
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 200,
            window: Duration::from_secs(60),
        }
    }
}

/// Sliding-window request tracker.
///
/// Timestamps older than the window are evicted lazily on each check, so
/// the deque never holds more than one window's worth of live entries plus
/// whatever expired since the last call.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    requests: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a limiter with the given window configuration.
    #[must_use]
    pub const fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            requests: VecDeque::new(),
        }
    }

    /// Check whether a request may proceed now.
    ///
    /// Returns `(true, 0)` when under capacity, otherwise `(false, wait)`
    /// where `wait` is the whole-second delay until the oldest recorded
    /// request leaves the window.
    pub fn allow(&mut self) -> (bool, u64) {
        self.allow_at(Instant::now())
    }

    /// Record a request as issued now.
    pub fn record(&mut self) {
        self.record_at(Instant::now());
    }

    /// Deterministic variant of [`RateLimiter::allow`] for an explicit instant.
    pub fn allow_at(&mut self, now: Instant) -> (bool, u64) {
        self.prune(now);

        if self.requests.len() < self.config.capacity {
            return (true, 0);
        }

        // The oldest surviving entry dictates how long until a slot frees.
        let Some(oldest) = self.requests.front() else {
            return (true, 0);
        };
        let elapsed = now.saturating_duration_since(*oldest);
        let remaining = self.config.window.saturating_sub(elapsed);
        let wait = remaining.as_secs_f64().ceil() as u64 + 1;
        (false, wait)
    }

    /// Deterministic variant of [`RateLimiter::record`] for an explicit instant.
    pub fn record_at(&mut self, now: Instant) {
        self.requests.push_back(now);
    }

    /// Number of requests currently inside the window.
    #[must_use]
    pub fn in_flight(&mut self) -> usize {
        self.prune(Instant::now());
        self.requests.len()
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.requests.front() {
            if now.saturating_duration_since(*front) >= self.config.window {
                self.requests.pop_front();
            } else {
                break;
            }
        }
    }
}
