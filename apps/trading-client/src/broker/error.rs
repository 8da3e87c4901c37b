//! Broker error taxonomy.
//!
//! The retry loop keys off these variants: [`BrokerError::Network`] and
//! [`BrokerError::Server`] are transient and retried, everything else
//! surfaces immediately.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from the brokerage client.
#[derive(Debug, Error, Clone)]
pub enum BrokerError {
    /// Network-level failure (connect, timeout, reset). Retried.
    #[error("network error: {0}")]
    Network(String),

    /// HTTP 5xx from the brokerage. Retried.
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the brokerage error body.
        message: String,
    },

    /// HTTP 4xx from the brokerage. Never retried.
    #[error("client error ({status}): {message}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Message from the brokerage error body.
        message: String,
    },

    /// HTTP 429 persisted through every retry attempt.
    ///
    /// Under normal operation rate limiting is absorbed by an internal
    /// sleep-and-retry and never reaches the caller.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested delay before trying again, in seconds.
        retry_after_secs: u64,
    },

    /// Market data older than the applicable freshness threshold.
    #[error(
        "stale market data: {age_minutes}m old exceeds the {threshold_minutes}m threshold \
         (market_open={market_open})"
    )]
    StaleData {
        /// Timestamp of the newest data point in the response.
        timestamp: DateTime<Utc>,
        /// Age of that data point in whole minutes.
        age_minutes: i64,
        /// Threshold that was exceeded, in minutes.
        threshold_minutes: i64,
        /// Whether the market was open when the check ran.
        market_open: bool,
    },

    /// Order ticket failed validation before any HTTP call was made.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Credentials were rejected (401/403) or empty.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Response body could not be decoded.
    #[error("malformed response body: {0}")]
    Json(String),
}

impl BrokerError {
    /// Whether the retry loop should try again on this error.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }

    /// Whether this is the brokerage's "position does not exist" 404.
    ///
    /// Polling a symbol without an open position is an expected code path,
    /// not a failure; callers map this case to an absent position. Any
    /// other 404 (unknown symbol, bad route) stays an error.
    #[must_use]
    pub fn is_no_position(&self) -> bool {
        match self {
            Self::Client { status: 404, message } => {
                message.to_ascii_lowercase().contains("position does not exist")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(BrokerError::Network("reset".into()).is_retryable());
        assert!(
            BrokerError::Server {
                status: 503,
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(
            !BrokerError::Client {
                status: 404,
                message: "not found".into()
            }
            .is_retryable()
        );
        assert!(!BrokerError::AuthenticationFailed.is_retryable());
        assert!(!BrokerError::InvalidOrder("qty".into()).is_retryable());
    }

    #[test]
    fn no_position_requires_404_and_message() {
        let missing = BrokerError::Client {
            status: 404,
            message: "position does not exist".into(),
        };
        assert!(missing.is_no_position());

        let other_404 = BrokerError::Client {
            status: 404,
            message: "asset not found".into(),
        };
        assert!(!other_404.is_no_position());

        let wrong_status = BrokerError::Client {
            status: 422,
            message: "position does not exist".into(),
        };
        assert!(!wrong_status.is_no_position());
    }

    #[test]
    fn stale_data_message_names_both_ages() {
        let err = BrokerError::StaleData {
            timestamp: Utc::now(),
            age_minutes: 10,
            threshold_minutes: 5,
            market_open: true,
        };
        let text = err.to_string();
        assert!(text.contains("10m"));
        assert!(text.contains("5m"));
        assert!(text.contains("market_open=true"));
    }
}
