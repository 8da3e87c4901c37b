//! Broker client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::rate_limit::RateLimitConfig;
use super::retry::RetryPolicy;

/// Trading mode for the brokerage API.
///
/// Selects the trading base URL and which credential pair is expected.
/// Anything that cannot be recognized defaults to paper trading; the
/// client never falls back to live trading silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    /// Paper trading (simulated fills).
    Paper,
    /// Live trading (real money).
    Live,
}

impl TradingMode {
    /// Base URL for the trading API.
    #[must_use]
    pub const fn trading_base_url(&self) -> &'static str {
        match self {
            Self::Paper => "https://paper-api.alpaca.markets",
            Self::Live => "https://api.alpaca.markets",
        }
    }

    /// Base URL for the market data API (shared across modes).
    #[must_use]
    pub const fn data_base_url(&self) -> &'static str {
        "https://data.alpaca.markets"
    }

    /// Check if this is live trading.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Parse a mode string, defaulting to [`TradingMode::Paper`].
    ///
    /// Unrecognized values map to paper trading so that a typo in an
    /// environment variable can never route orders to a live account.
    #[must_use]
    pub fn parse_or_paper(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "LIVE" => Self::Live,
            _ => Self::Paper,
        }
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paper => write!(f, "PAPER"),
            Self::Live => write!(f, "LIVE"),
        }
    }
}

/// Thresholds for market-data freshness validation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FreshnessPolicy {
    /// Maximum data age while the market is open (default: 5 minutes).
    pub market_hours_threshold: Duration,
    /// Maximum data age while the market is closed (default: 60 minutes).
    pub off_hours_threshold: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            market_hours_threshold: Duration::from_secs(5 * 60),
            off_hours_threshold: Duration::from_secs(60 * 60),
        }
    }
}

impl FreshnessPolicy {
    /// Threshold applicable for the given market state.
    #[must_use]
    pub const fn threshold(&self, market_open: bool) -> Duration {
        if market_open {
            self.market_hours_threshold
        } else {
            self.off_hours_threshold
        }
    }
}

/// Configuration for the brokerage client.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// API key id.
    pub api_key: String,
    /// API secret.
    pub api_secret: String,
    /// Trading mode.
    pub mode: TradingMode,
    /// Per-attempt HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Client-side rate limit window.
    pub rate_limit: RateLimitConfig,
    /// Market-data freshness thresholds.
    pub freshness: FreshnessPolicy,
    /// Override for the trading base URL (tests and proxies).
    pub trading_url_override: Option<String>,
    /// Override for the data base URL (tests and proxies).
    pub data_url_override: Option<String>,
}

impl BrokerConfig {
    /// Create a configuration with default timing policies.
    #[must_use]
    pub fn new(api_key: String, api_secret: String, mode: TradingMode) -> Self {
        Self {
            api_key,
            api_secret,
            mode,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: RateLimitConfig::default(),
            freshness: FreshnessPolicy::default(),
            trading_url_override: None,
            data_url_override: None,
        }
    }

    /// Set the per-attempt HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the rate limit window.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the freshness thresholds.
    #[must_use]
    pub const fn with_freshness(mut self, freshness: FreshnessPolicy) -> Self {
        self.freshness = freshness;
        self
    }

    /// Point both APIs at an alternate base URL (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.trading_url_override = Some(url.trim_end_matches('/').to_string());
        self.data_url_override = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Effective trading API base URL.
    #[must_use]
    pub fn trading_base_url(&self) -> &str {
        self.trading_url_override
            .as_deref()
            .unwrap_or_else(|| self.mode.trading_base_url())
    }

    /// Effective market data API base URL.
    #[must_use]
    pub fn data_base_url(&self) -> &str {
        self.data_url_override
            .as_deref()
            .unwrap_or_else(|| self.mode.data_base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_mode_urls() {
        let mode = TradingMode::Paper;
        assert!(mode.trading_base_url().contains("paper"));
        assert!(!mode.is_live());
    }

    #[test]
    fn live_mode_urls() {
        let mode = TradingMode::Live;
        assert!(!mode.trading_base_url().contains("paper"));
        assert!(mode.is_live());
    }

    #[test]
    fn unrecognized_mode_defaults_to_paper() {
        assert_eq!(TradingMode::parse_or_paper("live"), TradingMode::Live);
        assert_eq!(TradingMode::parse_or_paper(" LIVE "), TradingMode::Live);
        assert_eq!(TradingMode::parse_or_paper("paper"), TradingMode::Paper);
        assert_eq!(TradingMode::parse_or_paper("prod"), TradingMode::Paper);
        assert_eq!(TradingMode::parse_or_paper(""), TradingMode::Paper);
    }

    #[test]
    fn freshness_threshold_depends_on_market_state() {
        let policy = FreshnessPolicy::default();
        assert_eq!(policy.threshold(true), Duration::from_secs(300));
        assert_eq!(policy.threshold(false), Duration::from_secs(3600));
    }

    #[test]
    fn base_url_override_applies_to_both_apis() {
        let config = BrokerConfig::new("key".into(), "secret".into(), TradingMode::Paper)
            .with_base_url("http://localhost:9999/");
        assert_eq!(config.trading_base_url(), "http://localhost:9999");
        assert_eq!(config.data_base_url(), "http://localhost:9999");
    }

    #[test]
    fn mode_display() {
        assert_eq!(TradingMode::Paper.to_string(), "PAPER");
        assert_eq!(TradingMode::Live.to_string(), "LIVE");
    }
}
